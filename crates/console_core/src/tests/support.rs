//! In-memory record service shared by the controller tests.

use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{Organisation, OrganisationFields, PartnerCode},
    error::{ApiError, ErrorCode},
    protocol::{ListParams, Page},
};
use tokio::sync::Mutex;

use crate::{pagination::total_pages, service::RecordService};

pub fn organisation(code: i64, name: &str) -> Organisation {
    Organisation {
        partner_code: PartnerCode(code),
        partner_name: name.to_string(),
        partner_inn: format!("{:09}", code),
        create_time: None,
        update_time: None,
        create_user_fio: None,
    }
}

#[derive(Default)]
pub struct MemoryOrganisations {
    records: Mutex<Vec<Organisation>>,
    list_calls: Mutex<Vec<ListParams>>,
    fail_lists: AtomicBool,
}

impl MemoryOrganisations {
    pub fn with_names(names: &[&str]) -> Arc<Self> {
        let records = names
            .iter()
            .enumerate()
            .map(|(i, name)| organisation(i as i64 + 1, name))
            .collect();
        Arc::new(Self {
            records: Mutex::new(records),
            ..Default::default()
        })
    }

    pub fn with_count(count: usize) -> Arc<Self> {
        let names = (1..=count).map(|i| format!("Partner {i:02}")).collect::<Vec<_>>();
        let names = names.iter().map(String::as_str).collect::<Vec<_>>();
        Self::with_names(&names)
    }

    pub async fn list_calls(&self) -> Vec<ListParams> {
        self.list_calls.lock().await.clone()
    }

    pub async fn last_list_call(&self) -> Option<ListParams> {
        self.list_calls.lock().await.last().cloned()
    }

    pub fn fail_lists(&self, fail: bool) {
        self.fail_lists.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl RecordService<Organisation> for MemoryOrganisations {
    async fn list(&self, params: &ListParams) -> Result<Page<Organisation>> {
        self.list_calls.lock().await.push(params.clone());
        if self.fail_lists.load(Ordering::SeqCst) {
            return Err(anyhow!("connection reset by peer"));
        }

        let needle = params.search.as_deref().map(str::to_lowercase);
        let matching = self
            .records
            .lock()
            .await
            .iter()
            .filter(|org| match &needle {
                Some(needle) => org.partner_name.to_lowercase().contains(needle),
                None => true,
            })
            .cloned()
            .collect::<Vec<_>>();

        let count = matching.len() as u64;
        if params.page > total_pages(count, params.page_size).max(1) {
            return Err(ApiError::new(ErrorCode::NotFound, "Invalid page.").into());
        }
        let offset = (params.page as usize - 1) * params.page_size as usize;
        let results = matching
            .into_iter()
            .skip(offset)
            .take(params.page_size as usize)
            .collect();
        Ok(Page { count, results })
    }

    async fn create(&self, fields: &OrganisationFields) -> Result<Organisation> {
        let mut records = self.records.lock().await;
        if records
            .iter()
            .any(|org| org.partner_inn == fields.partner_inn)
        {
            return Err(anyhow!("duplicate INN"));
        }
        let code = records.iter().map(|org| org.partner_code.0).max().unwrap_or(0) + 1;
        let mut record = organisation(code, &fields.partner_name);
        record.partner_inn = fields.partner_inn.clone();
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: PartnerCode, fields: &OrganisationFields) -> Result<Organisation> {
        let mut records = self.records.lock().await;
        let record = records
            .iter_mut()
            .find(|org| org.partner_code == id)
            .ok_or_else(|| ApiError::new(ErrorCode::NotFound, "No Partner matches the given query."))?;
        record.partner_name = fields.partner_name.clone();
        record.partner_inn = fields.partner_inn.clone();
        Ok(record.clone())
    }
}
