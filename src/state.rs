use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::Database;
use crate::media::MediaStore;
use crate::services::mailer::Mailer;

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub media: Arc<dyn MediaStore>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: Database,
        media: Arc<dyn MediaStore>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            db,
            media,
            mailer,
        }
    }
}
