// Application state for HTTP handlers
use crate::application::motor_service::MotorService;
use crate::application::observer::BroadcastObserver;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub motor_service: Arc<MotorService>,
    pub events: BroadcastObserver,
}
