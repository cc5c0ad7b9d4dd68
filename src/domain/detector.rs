// Session state - running statistics and anomaly detection for one session
use super::alert::{Alert, Direction, SpikeChannel};
use super::sample::MotorSample;
use super::session::SessionConfig;

/// Everything one active session remembers between samples.
///
/// Built fresh by `start` and dropped by `end`; nothing here outlives a session.
#[derive(Debug, Clone)]
pub struct SessionState {
    config: SessionConfig,
    last_iq: Option<f64>,
    last_id: Option<f64>,
    last_coolant: Option<f64>,
    running_coolant_mean: f64,
    sample_count: u64,
    accepted_count: u64,
}

impl SessionState {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            last_iq: None,
            last_id: None,
            last_coolant: None,
            running_coolant_mean: 0.0,
            sample_count: 0,
            accepted_count: 0,
        }
    }

    pub fn session_id(&self) -> &str {
        &self.config.session_id
    }

    pub fn running_coolant_mean(&self) -> f64 {
        self.running_coolant_mean
    }

    pub fn sample_count(&self) -> u64 {
        self.sample_count
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count
    }

    /// Count a sample that reached the measurement log
    pub fn record_accepted(&mut self) -> u64 {
        self.accepted_count += 1;
        self.accepted_count
    }

    /// Update statistics with an accepted sample and return the anomalies it shows
    pub fn observe(&mut self, sample: &MotorSample) -> Vec<Alert> {
        let mut alerts = Vec::new();

        let iq_threshold = self.config.iq_threshold;
        let id_threshold = self.config.id_threshold;
        let t_threshold = self.config.t_threshold;
        alerts.extend(check_spike(
            &mut self.last_iq,
            sample.iq,
            iq_threshold,
            SpikeChannel::Iq,
            sample,
        ));
        alerts.extend(check_spike(
            &mut self.last_id,
            sample.id,
            id_threshold,
            SpikeChannel::Id,
            sample,
        ));
        alerts.extend(check_spike(
            &mut self.last_coolant,
            sample.coolant,
            t_threshold,
            SpikeChannel::Coolant,
            sample,
        ));
        alerts.extend(self.check_band(sample));

        alerts
    }

    // The mean includes the sample under test before the band is computed.
    fn check_band(&mut self, sample: &MotorSample) -> Option<Alert> {
        let n = self.sample_count as f64;
        self.running_coolant_mean = (self.running_coolant_mean * n + sample.coolant) / (n + 1.0);
        self.sample_count += 1;

        let mean = self.running_coolant_mean;
        let p = self.config.deviation_fraction();
        let low = mean * (1.0 - p);
        let high = mean * (1.0 + p);

        if sample.coolant < low {
            Some(Alert::out_of_band(sample.timestamp, sample.coolant, low, mean, Direction::Below))
        } else if sample.coolant > high {
            Some(Alert::out_of_band(sample.timestamp, sample.coolant, high, mean, Direction::Above))
        } else {
            None
        }
    }
}

fn check_spike(
    previous: &mut Option<f64>,
    current: f64,
    threshold: f64,
    channel: SpikeChannel,
    sample: &MotorSample,
) -> Option<Alert> {
    let alert = previous.and_then(|prev| {
        let delta = current - prev;
        (delta.abs() > threshold).then(|| Alert::spike(channel, sample.timestamp, delta, threshold))
    });
    *previous = Some(current);
    alert
}
