// Replay service - pushes a recorded CSV through a motor session
use crate::application::motor_api::MotorApi;
use crate::domain::session::{AckStatus, SessionConfig};
use crate::infrastructure::sample_reader::SampleReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    pub session_id: String,
    /// Decoded samples taken from the file
    pub loaded: usize,
    pub successful: usize,
    pub failed: usize,
    /// Decoder counters
    pub accepted: usize,
    pub rejected: usize,
    pub end_status: AckStatus,
    pub reject_log: PathBuf,
}

#[derive(Clone)]
pub struct ReplayService {
    api: Arc<dyn MotorApi>,
    max_samples: usize,
    reject_dir: PathBuf,
}

impl ReplayService {
    pub fn new(api: Arc<dyn MotorApi>, max_samples: usize, reject_dir: impl Into<PathBuf>) -> Self {
        Self {
            api,
            max_samples,
            reject_dir: reject_dir.into(),
        }
    }

    pub async fn replay(&self, csv_path: &Path, config: SessionConfig) -> anyhow::Result<ReplayReport> {
        let session_id = config.session_id.clone();
        let ack = self.api.start_session(config).await?;
        tracing::info!(status = ?ack.status, "motor session start requested");
        if !ack.success {
            anyhow::bail!("Motor session was not started: {}", ack.message);
        }

        let reject_log = self
            .reject_dir
            .join(format!("rejects_motor_{}.csv", session_id));

        // once started, the session is ended on every path
        let sent = self.send_samples(csv_path, &reject_log).await;
        let end = self.api.end_session().await;
        let sent = match sent {
            Ok(sent) => sent,
            Err(e) => {
                match &end {
                    Ok(ack) => tracing::warn!(status = ?ack.status, "motor session ended after replay failure"),
                    Err(end_err) => tracing::warn!(error = %end_err, "failed to end motor session"),
                }
                return Err(e);
            }
        };
        let end = end?;

        let report = ReplayReport {
            session_id,
            loaded: sent.loaded,
            successful: sent.successful,
            failed: sent.failed,
            accepted: sent.accepted,
            rejected: sent.rejected,
            end_status: end.status,
            reject_log,
        };

        if report.loaded == 0 {
            tracing::warn!("no motor samples were sent; check the CSV format or path");
        }
        tracing::info!(
            loaded = report.loaded,
            successful = report.successful,
            failed = report.failed,
            accepted = report.accepted,
            rejected = report.rejected,
            "motor replay finished"
        );
        Ok(report)
    }

    async fn send_samples(&self, csv_path: &Path, reject_log: &Path) -> anyhow::Result<SendCounts> {
        let mut reader = SampleReader::open(csv_path, reject_log)?;
        tracing::info!(path = %csv_path.display(), "reading motor data");

        let mut counts = SendCounts::default();
        while counts.loaded < self.max_samples {
            let Some(sample) = reader.next_sample()? else {
                break;
            };
            counts.loaded += 1;

            let ack = self.api.push_sample(sample).await?;
            if ack.success {
                counts.successful += 1;
            } else {
                counts.failed += 1;
                if counts.failed <= 3 {
                    tracing::warn!(message = %ack.message, "motor service refused sample");
                }
            }

            if counts.loaded % 10 == 0 {
                tracing::debug!(
                    loaded = counts.loaded,
                    successful = counts.successful,
                    failed = counts.failed,
                    "replay progress"
                );
            }
        }

        counts.accepted = reader.accepted();
        counts.rejected = reader.rejected();
        Ok(counts)
    }
}

#[derive(Debug, Default)]
struct SendCounts {
    loaded: usize,
    successful: usize,
    failed: usize,
    accepted: usize,
    rejected: usize,
}
