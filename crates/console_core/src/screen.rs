use std::{sync::Arc, time::Duration};

use shared::domain::Resource;
use tracing::warn;

use crate::{
    drag::DragController,
    error::InvalidState,
    list_sync::{ListQuery, ListSyncController},
    service::RecordService,
    submission::{SubmissionController, SubmissionState},
};

pub struct ResourceScreen<R: Resource> {
    service: Arc<dyn RecordService<R>>,
    list: Arc<ListSyncController<R>>,
    form: SubmissionController,
    dialog: DragController,
}

impl<R: Resource> ResourceScreen<R> {
    pub fn new(service: Arc<dyn RecordService<R>>, settle_delay: Duration) -> Self {
        Self::with_query(service, ListQuery::for_resource::<R>(), settle_delay)
    }

    pub fn with_query(
        service: Arc<dyn RecordService<R>>,
        query: ListQuery,
        settle_delay: Duration,
    ) -> Self {
        let list = Arc::new(ListSyncController::new(Arc::clone(&service), query));
        Self {
            service,
            list,
            form: SubmissionController::with_settle_delay(settle_delay),
            dialog: DragController::new(),
        }
    }

    pub fn list(&self) -> &Arc<ListSyncController<R>> {
        &self.list
    }

    pub fn form(&self) -> &SubmissionController {
        &self.form
    }

    pub fn dialog(&self) -> &DragController {
        &self.dialog
    }

    pub fn dialog_mut(&mut self) -> &mut DragController {
        &mut self.dialog
    }

    pub fn close_dialog(&mut self) {
        self.dialog.reset();
        self.form.reset();
    }

    pub async fn create(&self, fields: R::Fields) -> Result<SubmissionState, InvalidState> {
        let service = Arc::clone(&self.service);
        self.form
            .submit_validated(
                fields,
                move |fields| async move {
                    let record = service.create(&fields).await?;
                    Ok::<_, anyhow::Error>(format!("{} {} created", R::LABEL, record.id()))
                },
                self.refresh_on_settle(),
            )
            .await
    }

    pub async fn update(
        &self,
        id: R::Id,
        fields: R::Fields,
    ) -> Result<SubmissionState, InvalidState> {
        let service = Arc::clone(&self.service);
        self.form
            .submit_validated(
                fields,
                move |fields| async move {
                    let record = service.update(id, &fields).await?;
                    Ok::<_, anyhow::Error>(format!("{} {} updated", R::LABEL, record.id()))
                },
                self.refresh_on_settle(),
            )
            .await
    }

    pub fn dispose(&self) {
        self.form.dispose();
        self.list.dispose();
    }

    fn refresh_on_settle(&self) -> impl FnOnce() + Send + 'static {
        let list = Arc::clone(&self.list);
        move || {
            tokio::spawn(async move {
                if let Err(err) = list.refresh().await {
                    warn!(%err, "screen: refresh after save failed");
                }
            });
        }
    }
}

#[cfg(test)]
#[path = "tests/screen_tests.rs"]
mod tests;
