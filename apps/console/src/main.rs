use std::{future::Future, path::PathBuf, sync::Arc};

use anyhow::{bail, Result};
use clap::{Args, Parser, Subcommand};
use console_core::{
    pagination::{can_go_next, can_go_previous},
    page_items, HttpRecordService, ListQuery, ListSyncController, Localizer, MissingSession,
    PageItem, RecordService, SessionProvider, StaticSession, SubmissionController, SubmissionState,
    TranslationCatalog,
};
use shared::domain::{
    Language, Organisation, OrganisationFields, PartnerCode, Resource, Translation,
    TranslationFields, TranslationId,
};
use tokio::sync::oneshot;
use tracing_subscriber::EnvFilter;

mod config;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "console.toml")]
    config: PathBuf,
    /// Overrides the configured API base URL.
    #[arg(long)]
    api_url: Option<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    #[command(subcommand)]
    Organisations(OrganisationCommand),
    #[command(subcommand)]
    Translations(TranslationCommand),
    /// Resolve a translation key the way the console labels do.
    Lookup {
        key: String,
        #[arg(long)]
        lang: Option<String>,
    },
}

#[derive(Subcommand, Debug)]
enum OrganisationCommand {
    List(ListArgs),
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        inn: String,
    },
    Update {
        code: i64,
        #[arg(long)]
        name: String,
        #[arg(long)]
        inn: String,
    },
}

#[derive(Subcommand, Debug)]
enum TranslationCommand {
    List(ListArgs),
    Create(TranslationArgs),
    Update {
        id: i64,
        #[command(flatten)]
        fields: TranslationArgs,
    },
}

#[derive(Args, Debug)]
struct ListArgs {
    #[arg(long, default_value_t = 1)]
    page: u32,
    #[arg(long)]
    search: Option<String>,
}

#[derive(Args, Debug)]
struct TranslationArgs {
    #[arg(long)]
    key: String,
    #[arg(long, default_value = "")]
    en: String,
    #[arg(long, default_value = "")]
    ru: String,
    #[arg(long, default_value = "")]
    uz: String,
}

impl From<TranslationArgs> for TranslationFields {
    fn from(args: TranslationArgs) -> Self {
        Self {
            key: args.key,
            en: args.en,
            ru: args.ru,
            uz: args.uz,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();

    let mut settings = config::load_settings(&cli.config);
    if let Some(api_url) = cli.api_url {
        settings.api_base_url = api_url;
    }
    let session: Arc<dyn SessionProvider> = match settings.access_token.clone() {
        Some(token) => Arc::new(StaticSession::new(token)),
        None => Arc::new(MissingSession),
    };
    let service = Arc::new(HttpRecordService::new(&settings.api_base_url, session)?);
    let organisation_form =
        SubmissionController::with_settle_delay(settings.organisation_settle_delay());
    let translation_form =
        SubmissionController::with_settle_delay(settings.translation_settle_delay());

    match cli.command {
        Command::Organisations(OrganisationCommand::List(args)) => {
            list_records::<Organisation>(service, settings.organisation_page_size, args, |org| {
                format!(
                    "{:>6}  {:<40}  {}",
                    org.partner_code, org.partner_name, org.partner_inn
                )
            })
            .await?;
        }
        Command::Organisations(OrganisationCommand::Create { name, inn }) => {
            save::<Organisation, _, _>(&organisation_form, OrganisationFields::new(name, inn), |fields| async move {
                RecordService::<Organisation>::create(service.as_ref(), &fields).await
            })
            .await?;
        }
        Command::Organisations(OrganisationCommand::Update { code, name, inn }) => {
            save::<Organisation, _, _>(&organisation_form, OrganisationFields::new(name, inn), |fields| async move {
                RecordService::<Organisation>::update(service.as_ref(), PartnerCode(code), &fields)
                    .await
            })
            .await?;
        }
        Command::Translations(TranslationCommand::List(args)) => {
            let language = settings.language;
            list_records::<Translation>(service, settings.translation_page_size, args, move |t| {
                format!(
                    "{:>6}  {:<40}  {}",
                    t.translation_id,
                    t.key,
                    t.text(language).unwrap_or("-")
                )
            })
            .await?;
        }
        Command::Translations(TranslationCommand::Create(args)) => {
            save::<Translation, _, _>(&translation_form, args.into(), |fields| async move {
                RecordService::<Translation>::create(service.as_ref(), &fields).await
            })
            .await?;
        }
        Command::Translations(TranslationCommand::Update { id, fields }) => {
            save::<Translation, _, _>(&translation_form, fields.into(), |fields| async move {
                RecordService::<Translation>::update(service.as_ref(), TranslationId(id), &fields)
                    .await
            })
            .await?;
        }
        Command::Lookup { key, lang } => {
            let language = match lang {
                Some(raw) => raw.parse::<Language>()?,
                None => settings.language,
            };
            let catalog =
                TranslationCatalog::new(language, service.fetch_translation_catalog().await?);
            println!("{}", catalog.resolve(&key));
        }
    }

    Ok(())
}

async fn list_records<R: Resource>(
    service: Arc<HttpRecordService>,
    page_size: u32,
    args: ListArgs,
    render: impl Fn(&R) -> String,
) -> Result<()> {
    let list = ListSyncController::<R>::new(service, ListQuery::new(page_size));
    if let Some(search) = args.search.as_deref() {
        list.set_filter(search);
    }
    // The first response tells us how many pages exist.
    list.commit_filter().await?;
    if args.page > 1 {
        list.set_page(args.page).await?;
    }

    let snapshot = list.snapshot();
    for record in &snapshot.records {
        println!("{}", render(record));
    }
    let query = &snapshot.query;
    println!(
        "{} {}s, page {} of {}",
        query.total_count,
        R::LABEL,
        query.page,
        query.total_pages().max(1)
    );
    println!("{}", page_strip(query.page, query.total_pages()));
    Ok(())
}

fn page_strip(current: u32, total_pages: u32) -> String {
    let mut parts = Vec::new();
    if can_go_previous(current) {
        parts.push("<".to_string());
    }
    for item in page_items(current, total_pages) {
        parts.push(match item {
            PageItem::Page {
                number,
                current: true,
            } => format!("[{number}]"),
            PageItem::Page { number, .. } => number.to_string(),
            PageItem::Ellipsis => "...".to_string(),
        });
    }
    if can_go_next(current, total_pages) {
        parts.push(">".to_string());
    }
    parts.join(" ")
}

async fn save<R, F, Fut>(form: &SubmissionController, fields: R::Fields, operation: F) -> Result<()>
where
    R: Resource,
    F: FnOnce(R::Fields) -> Fut,
    Fut: Future<Output = Result<R>>,
{
    let (settled_tx, settled_rx) = oneshot::channel();
    let state = form
        .submit_validated(
            fields,
            |fields| async move {
                let record = operation(fields).await?;
                Ok::<_, anyhow::Error>(format!("{} {} saved", R::LABEL, record.id()))
            },
            move || {
                let _ = settled_tx.send(());
            },
        )
        .await?;

    match state {
        SubmissionState::Succeeded(message) => {
            println!("{message}");
            let _ = settled_rx.await;
            Ok(())
        }
        SubmissionState::Failed(err) => bail!("{err}"),
        other => bail!("unexpected submission state: {other:?}"),
    }
}
