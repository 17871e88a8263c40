use std::sync::Arc;

use axum::extract::FromRef;

use crate::config::Config;
use crate::engine::ExamServiceRegistry;
use crate::store::PracticeStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn PracticeStore>,
    pub registry: Arc<ExamServiceRegistry>,
    pub config: Config,
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
