// Boundary calls of the motor engine, local or remote
use crate::application::motor_service::MotorService;
use crate::domain::sample::MotorSample;
use crate::domain::session::{Ack, SessionConfig};
use async_trait::async_trait;

#[async_trait]
pub trait MotorApi: Send + Sync {
    async fn start_session(&self, config: SessionConfig) -> anyhow::Result<Ack>;

    async fn push_sample(&self, sample: MotorSample) -> anyhow::Result<Ack>;

    async fn end_session(&self) -> anyhow::Result<Ack>;
}

/// In-process access, no transport involved
#[async_trait]
impl MotorApi for MotorService {
    async fn start_session(&self, config: SessionConfig) -> anyhow::Result<Ack> {
        Ok(self.start(config))
    }

    async fn push_sample(&self, sample: MotorSample) -> anyhow::Result<Ack> {
        Ok(self.submit(sample))
    }

    async fn end_session(&self) -> anyhow::Result<Ack> {
        Ok(self.end())
    }
}
