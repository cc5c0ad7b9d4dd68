// Domain layer - samples, decoding, detection
pub mod alert;
pub mod decoder;
pub mod detector;
pub mod sample;
pub mod session;
