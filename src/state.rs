use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::classifier::SpecialtyClassifier;
use crate::services::directory::{BookingStore, DoctorDirectory};

/// Shared application state. Collaborators sit behind trait objects so
/// tests can swap in mocks without touching the router.
pub struct AppState {
    pub config: AppConfig,
    pub directory: Box<dyn DoctorDirectory>,
    pub store: Box<dyn BookingStore>,
    pub classifier: Box<dyn SpecialtyClassifier>,
}

pub type SharedState = Arc<AppState>;
