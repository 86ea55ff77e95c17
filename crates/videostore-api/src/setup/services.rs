//! Service wiring

use crate::services::files::FileService;
use crate::state::AppState;
use std::sync::Arc;
use videostore_core::Config;
use videostore_db::FileRepository;
use videostore_processing::ContentValidator;
use videostore_storage::Storage;

/// Build the application state from its backends.
pub fn initialize_services(
    config: &Config,
    repository: Arc<dyn FileRepository>,
    storage: Arc<dyn Storage>,
) -> Arc<AppState> {
    let validator = ContentValidator::new(
        config.max_file_size_bytes(),
        config.allowed_content_types().to_vec(),
        config.extension_fallback(),
    );

    let files = FileService::new(storage.clone(), repository.clone(), validator);

    Arc::new(AppState {
        config: config.clone(),
        files,
        repository,
        storage,
    })
}
