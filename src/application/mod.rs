// Application layer - use cases and the ports they depend on
pub mod motor_api;
pub mod motor_service;
pub mod observer;
pub mod replay_service;
pub mod session_sink;
