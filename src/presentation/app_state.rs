// Application state for HTTP handlers
use crate::application::care_repository::CareDataAccess;
use crate::application::vitals_service::VitalsDashboard;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub dashboard: Arc<VitalsDashboard>,
    pub care_data: Arc<dyn CareDataAccess>,
}
