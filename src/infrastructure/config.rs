use crate::domain::session::SessionConfig;
use chrono::Utc;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub storage: StorageSettings,
    pub thresholds: ThresholdSettings,
    pub replay: ReplaySettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub root: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ThresholdSettings {
    pub iq: f64,
    pub id: f64,
    pub t: f64,
    pub deviation_percent: f64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReplaySettings {
    pub server_url: String,
    pub max_samples: usize,
    pub reject_dir: PathBuf,
}

fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
    Ok(config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:4101")?
        .set_default("storage.root", "MotorStorage")?
        .set_default("thresholds.iq", 1.0)?
        .set_default("thresholds.id", 1.0)?
        .set_default("thresholds.t", 5.0)?
        .set_default("thresholds.deviation_percent", 25.0)?
        .set_default("replay.server_url", "http://127.0.0.1:4101")?
        .set_default("replay.max_samples", 100)?
        .set_default("replay.reject_dir", "Dataset")?)
}

/// Defaults, then `config/motor.*`, then `MOTOR__SECTION__KEY` environment variables
pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = builder()?
        .add_source(config::File::with_name("config/motor").required(false))
        .add_source(config::Environment::with_prefix("MOTOR").separator("__"))
        .build()?;

    Ok(settings.try_deserialize()?)
}

impl ThresholdSettings {
    /// Session parameters for a new session id
    pub fn session_config(&self, session_id: String) -> SessionConfig {
        SessionConfig {
            session_id,
            started_at: Utc::now(),
            iq_threshold: self.iq,
            id_threshold: self.id,
            t_threshold: self.t,
            deviation_percent: self.deviation_percent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config: AppConfig = builder().unwrap().build().unwrap().try_deserialize().unwrap();
        assert_eq!(config.server.bind_addr, "0.0.0.0:4101");
        assert_eq!(config.storage.root, PathBuf::from("MotorStorage"));
        assert_eq!(config.thresholds.t, 5.0);
        assert_eq!(config.replay.max_samples, 100);
    }

    #[test]
    fn test_file_overrides_defaults() {
        let toml = "[thresholds]\niq = 2.5\ndeviation_percent = 10\n\n[replay]\nmax_samples = 5\n";
        let config: AppConfig = builder()
            .unwrap()
            .add_source(config::File::from_str(toml, config::FileFormat::Toml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        assert_eq!(config.thresholds.iq, 2.5);
        assert_eq!(config.thresholds.id, 1.0);
        assert_eq!(config.thresholds.deviation_percent, 10.0);
        assert_eq!(config.replay.max_samples, 5);

        let session = config.thresholds.session_config("s".to_string());
        assert_eq!(session.iq_threshold, 2.5);
        assert!(session.validate().is_ok());
    }
}
