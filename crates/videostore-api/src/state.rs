//! Application state shared by all handlers.

use crate::services::files::FileService;
use std::sync::Arc;
use videostore_core::Config;
use videostore_db::FileRepository;
use videostore_storage::Storage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub files: FileService,
    /// Held separately from the service for health checks
    pub repository: Arc<dyn FileRepository>,
    pub storage: Arc<dyn Storage>,
}
