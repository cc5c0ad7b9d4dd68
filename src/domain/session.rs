// Session domain models - configuration, acknowledgements, lifecycle events
use super::alert::Alert;
use super::sample::MotorSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Component, Path};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    #[serde(default)]
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub iq_threshold: f64,
    pub id_threshold: f64,
    pub t_threshold: f64,
    pub deviation_percent: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("IqThreshold must be positive")]
    IqThreshold,
    #[error("IdThreshold must be positive")]
    IdThreshold,
    #[error("TThreshold must be positive")]
    TThreshold,
    #[error("DeviationPercent must be between 0 and 100")]
    DeviationPercent,
    #[error("SessionId must be a single path segment")]
    SessionId,
}

/// Whether `id` names exactly one entry directly below a directory
pub fn is_path_segment(id: &str) -> bool {
    let mut components = Path::new(id).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    ) && !id.contains(['/', '\\'])
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        // `!(x > 0.0)` also rejects NaN
        if !(self.iq_threshold > 0.0) {
            return Err(ConfigError::IqThreshold);
        }
        if !(self.id_threshold > 0.0) {
            return Err(ConfigError::IdThreshold);
        }
        if !(self.t_threshold > 0.0) {
            return Err(ConfigError::TThreshold);
        }
        if !(self.deviation_percent > 0.0 && self.deviation_percent <= 100.0) {
            return Err(ConfigError::DeviationPercent);
        }
        // blank ids are replaced when the session starts
        if !self.session_id.trim().is_empty() && !is_path_segment(&self.session_id) {
            return Err(ConfigError::SessionId);
        }
        Ok(())
    }

    /// Deviation band half-width as a fraction of the mean
    pub fn deviation_fraction(&self) -> f64 {
        self.deviation_percent / 100.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AckStatus {
    Nack,
    InProgress,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub session_id: String,
    pub accepted_count: u64,
}

/// The only value returned across the service boundary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ack {
    pub success: bool,
    pub message: String,
    pub status: AckStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub summary: Option<SessionSummary>,
}

impl Ack {
    pub fn ok(message: impl Into<String>, status: AckStatus) -> Self {
        Self {
            success: true,
            message: message.into(),
            status,
            summary: None,
        }
    }

    pub fn fail(message: impl Into<String>, status: AckStatus) -> Self {
        Self {
            success: false,
            message: message.into(),
            status,
            summary: None,
        }
    }

    pub fn completed(summary: SessionSummary) -> Self {
        Self {
            success: true,
            message: format!(
                "Session completed: {} samples accepted (session {})",
                summary.accepted_count, summary.session_id
            ),
            status: AckStatus::Completed,
            summary: Some(summary),
        }
    }
}

/// Lifecycle notifications published by the engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum SessionEvent {
    #[serde(rename_all = "camelCase")]
    Started {
        session_id: String,
        storage: String,
        config: SessionConfig,
    },
    #[serde(rename_all = "camelCase")]
    SampleAccepted {
        accepted_count: u64,
        sample: MotorSample,
    },
    SampleRejected {
        reason: String,
    },
    AlertRaised(Alert),
    Completed(SessionSummary),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SessionConfig {
        SessionConfig {
            session_id: "s1".to_string(),
            started_at: Utc::now(),
            iq_threshold: 1.0,
            id_threshold: 1.0,
            t_threshold: 5.0,
            deviation_percent: 25.0,
        }
    }

    #[test]
    fn test_config_validation() {
        assert_eq!(config().validate(), Ok(()));

        let mut c = config();
        c.iq_threshold = 0.0;
        assert_eq!(c.validate(), Err(ConfigError::IqThreshold));

        let mut c = config();
        c.t_threshold = f64::NAN;
        assert_eq!(c.validate(), Err(ConfigError::TThreshold));

        let mut c = config();
        c.deviation_percent = 100.0;
        assert_eq!(c.validate(), Ok(()));
        c.deviation_percent = 100.5;
        assert_eq!(c.validate(), Err(ConfigError::DeviationPercent));
        c.deviation_percent = 0.0;
        assert_eq!(c.validate(), Err(ConfigError::DeviationPercent));
    }

    #[test]
    fn test_session_id_must_stay_below_storage_root() {
        for id in ["../escaped", "/tmp/abs", "a/b", "a\\b", "..", ".", "run/"] {
            let mut c = config();
            c.session_id = id.to_string();
            assert_eq!(c.validate(), Err(ConfigError::SessionId), "{id}");
        }

        let mut c = config();
        c.session_id = "motor-run_42.a".to_string();
        assert_eq!(c.validate(), Ok(()));
        c.session_id = "   ".to_string();
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_ack_status_wire_names() {
        let ack = Ack::ok("Session started", AckStatus::InProgress);
        let json = serde_json::to_value(&ack).unwrap();
        assert_eq!(json["status"], "IN_PROGRESS");
        assert!(json.get("summary").is_none());
        assert_eq!(serde_json::to_value(AckStatus::Nack).unwrap(), "NACK");
        assert_eq!(serde_json::to_value(AckStatus::Completed).unwrap(), "COMPLETED");
    }

    #[test]
    fn test_config_wire_names() {
        let json = r#"{"startedAt":"2024-01-01T00:00:00Z","iqThreshold":1.0,"idThreshold":2.0,"tThreshold":5.0,"deviationPercent":25.0}"#;
        let c: SessionConfig = serde_json::from_str(json).unwrap();
        assert_eq!(c.session_id, "");
        assert_eq!(c.id_threshold, 2.0);
    }
}
