// Alert domain model
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlertKind {
    ElectricSpikeQ,
    ElectricSpikeD,
    TemperatureSpike,
    OutOfBandLow,
    OutOfBandHigh,
}

impl AlertKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertKind::ElectricSpikeQ => "ElectricSpikeQ",
            AlertKind::ElectricSpikeD => "ElectricSpikeD",
            AlertKind::TemperatureSpike => "TemperatureSpike",
            AlertKind::OutOfBandLow => "OutOfBandLow",
            AlertKind::OutOfBandHigh => "OutOfBandHigh",
        }
    }

    /// Coolant band alerts are logged with one decimal, everything else with three
    pub fn precision(&self) -> usize {
        match self {
            AlertKind::OutOfBandLow | AlertKind::OutOfBandHigh => 1,
            _ => 3,
        }
    }
}

impl fmt::Display for AlertKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Above,
    Below,
}

impl Direction {
    pub fn of(delta: f64) -> Self {
        if delta > 0.0 {
            Direction::Above
        } else {
            Direction::Below
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Above => f.write_str("above expected"),
            Direction::Below => f.write_str("below expected"),
        }
    }
}

/// One detected anomaly.
///
/// Spike alerts carry the signed sample-to-sample delta as `value` and the
/// channel threshold; band alerts carry the observed coolant temperature and
/// the breached band bound.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub timestamp: DateTime<Utc>,
    pub kind: AlertKind,
    pub direction: Direction,
    pub message: String,
    pub value: f64,
    pub threshold: f64,
}

/// Channels watched for sample-to-sample jumps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpikeChannel {
    Iq,
    Id,
    Coolant,
}

impl SpikeChannel {
    fn kind(&self) -> AlertKind {
        match self {
            SpikeChannel::Iq => AlertKind::ElectricSpikeQ,
            SpikeChannel::Id => AlertKind::ElectricSpikeD,
            SpikeChannel::Coolant => AlertKind::TemperatureSpike,
        }
    }

    fn label(&self) -> (&'static str, &'static str, &'static str) {
        match self {
            SpikeChannel::Iq => ("ELECTRIC SPIKE Q", "dIq", "A"),
            SpikeChannel::Id => ("ELECTRIC SPIKE D", "dId", "A"),
            SpikeChannel::Coolant => ("TEMPERATURE SPIKE", "dT", "C"),
        }
    }
}

impl Alert {
    pub fn spike(
        channel: SpikeChannel,
        timestamp: DateTime<Utc>,
        delta: f64,
        threshold: f64,
    ) -> Self {
        let direction = Direction::of(delta);
        let (title, symbol, unit) = channel.label();
        let message = format!(
            "{title} {symbol}={delta:.3} {unit} ({direction}) Threshold={threshold:.3} {unit}"
        );
        Self {
            timestamp,
            kind: channel.kind(),
            direction,
            message,
            value: delta,
            threshold,
        }
    }

    pub fn out_of_band(
        timestamp: DateTime<Utc>,
        coolant: f64,
        bound: f64,
        mean: f64,
        direction: Direction,
    ) -> Self {
        let (kind, relation) = match direction {
            Direction::Above => (AlertKind::OutOfBandHigh, ">"),
            Direction::Below => (AlertKind::OutOfBandLow, "<"),
        };
        let message = format!(
            "OUT OF BAND Coolant temp {direction} T={coolant:.1} C {relation} {bound:.1} C Mean={mean:.1} C"
        );
        Self {
            timestamp,
            kind,
            direction,
            message,
            value: coolant,
            threshold: bound,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spike_message() {
        let alert = Alert::spike(SpikeChannel::Iq, Utc::now(), 1.5, 1.0);
        assert_eq!(alert.kind, AlertKind::ElectricSpikeQ);
        assert_eq!(alert.direction, Direction::Above);
        assert_eq!(
            alert.message,
            "ELECTRIC SPIKE Q dIq=1.500 A (above expected) Threshold=1.000 A"
        );

        let alert = Alert::spike(SpikeChannel::Coolant, Utc::now(), -6.0, 5.0);
        assert_eq!(alert.kind, AlertKind::TemperatureSpike);
        assert_eq!(alert.direction, Direction::Below);
    }

    #[test]
    fn test_band_message() {
        let alert = Alert::out_of_band(Utc::now(), 20.0, 15.625, 12.5, Direction::Above);
        assert_eq!(alert.kind, AlertKind::OutOfBandHigh);
        assert_eq!(alert.kind.precision(), 1);
        assert_eq!(
            alert.message,
            "OUT OF BAND Coolant temp above expected T=20.0 C > 15.6 C Mean=12.5 C"
        );
    }
}
