pub mod adapters;
pub mod domain;
pub mod infra;
pub mod services;

use std::sync::Arc;

use services::reconciler::Reconciler;

#[derive(Clone)]
pub struct AppState {
    pub reconciler: Arc<Reconciler>,
}
