pub mod config;
pub mod error;
pub mod handlers;
pub mod infrastructure;
pub mod models;
pub mod services;

use crate::config::NotifierConfig;
use crate::services::mailer::Mailer;
use crate::services::storage::StorageService;
use crate::services::strava::ActivityApi;
use std::sync::Arc;

pub use crate::error::{NotifierError, Result};
pub use crate::handlers::upload::handle_upload;

/// Everything an invocation needs, built once per process.
#[derive(Clone)]
pub struct AppState {
    pub config: NotifierConfig,
    pub storage: Arc<dyn StorageService>,
    pub activities: Arc<dyn ActivityApi>,
    pub mailer: Arc<dyn Mailer>,
}
