pub mod drag;
pub mod error;
pub mod i18n;
pub mod list_sync;
pub mod pagination;
pub mod screen;
pub mod service;
pub mod submission;

pub use drag::{DragController, DragState, Point};
pub use error::{FormError, InvalidState, ListSyncError};
pub use i18n::{Localizer, TranslationCatalog};
pub use list_sync::{FetchOutcome, ListQuery, ListSnapshot, ListSyncController};
pub use pagination::{page_items, PageItem};
pub use screen::ResourceScreen;
pub use service::{HttpRecordService, MissingSession, RecordService, SessionProvider, StaticSession};
pub use submission::{SubmissionController, SubmissionState, DEFAULT_SETTLE_DELAY};

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;
