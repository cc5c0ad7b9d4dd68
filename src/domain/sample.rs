// Motor sample domain model
use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Lowest physically meaningful temperature (°C)
pub const ABSOLUTE_ZERO_C: f64 = -273.15;

/// One PMSM reading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MotorSample {
    #[serde(default)]
    pub timestamp: DateTime<Utc>,
    /// q-axis current component (A)
    pub iq: f64,
    /// d-axis current component (A)
    pub id: f64,
    /// Coolant temperature (°C)
    pub coolant: f64,
    pub profile_id: i32,
    /// Ambient temperature (°C)
    pub ambient: f64,
    /// Motor torque (Nm)
    #[serde(default)]
    pub torque: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SampleError {
    #[error("Invalid Iq: {0}")]
    Iq(f64),
    #[error("Invalid Id: {0}")]
    Id(f64),
    #[error("Invalid Coolant temperature: {0}")]
    Coolant(f64),
    #[error("Invalid ProfileId: {0}")]
    ProfileId(i32),
    #[error("Invalid Ambient temperature: {0}")]
    Ambient(f64),
    #[error("Invalid Torque: {0}")]
    Torque(f64),
    #[error("Invalid Timestamp: {0}")]
    Timestamp(String),
}

impl MotorSample {
    pub fn new(
        timestamp: DateTime<Utc>,
        iq: f64,
        id: f64,
        coolant: f64,
        profile_id: i32,
        ambient: f64,
        torque: f64,
    ) -> Self {
        Self {
            timestamp,
            iq,
            id,
            coolant,
            profile_id,
            ambient,
            torque,
        }
    }

    /// Check the physical invariants of a reading, first failure wins
    pub fn validate(&self) -> Result<(), SampleError> {
        if !self.iq.is_finite() {
            return Err(SampleError::Iq(self.iq));
        }
        if !self.id.is_finite() {
            return Err(SampleError::Id(self.id));
        }
        if !self.coolant.is_finite() || self.coolant < ABSOLUTE_ZERO_C {
            return Err(SampleError::Coolant(self.coolant));
        }
        if self.profile_id < 0 {
            return Err(SampleError::ProfileId(self.profile_id));
        }
        if !self.ambient.is_finite() || self.ambient < ABSOLUTE_ZERO_C {
            return Err(SampleError::Ambient(self.ambient));
        }
        if !self.torque.is_finite() {
            return Err(SampleError::Torque(self.torque));
        }
        if self.timestamp == DateTime::<Utc>::default() {
            return Err(SampleError::Timestamp(format_timestamp(&self.timestamp)));
        }
        Ok(())
    }

    /// Comma separated record in measurement-log column order
    pub fn to_record(&self) -> String {
        format!(
            "{},{},{},{},{},{},{}",
            format_timestamp(&self.timestamp),
            self.iq,
            self.id,
            self.coolant,
            self.profile_id,
            self.ambient,
            self.torque
        )
    }
}

/// Round-trippable ISO-8601 form used by every log
pub fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample() -> MotorSample {
        let ts = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
        MotorSample::new(ts, 1.5, -0.25, 18.0, 4, 19.5, 10.0)
    }

    #[test]
    fn test_valid_sample_passes() {
        assert_eq!(sample().validate(), Ok(()));
    }

    #[test]
    fn test_validation_rejects_non_finite_currents() {
        let mut s = sample();
        s.iq = f64::NAN;
        assert!(matches!(s.validate(), Err(SampleError::Iq(_))));

        let mut s = sample();
        s.id = f64::INFINITY;
        assert_eq!(s.validate(), Err(SampleError::Id(f64::INFINITY)));
    }

    #[test]
    fn test_validation_enforces_absolute_zero() {
        let mut s = sample();
        s.coolant = -300.0;
        assert_eq!(s.validate(), Err(SampleError::Coolant(-300.0)));

        let mut s = sample();
        s.ambient = -273.16;
        assert_eq!(s.validate(), Err(SampleError::Ambient(-273.16)));

        let mut s = sample();
        s.coolant = ABSOLUTE_ZERO_C;
        assert_eq!(s.validate(), Ok(()));
    }

    #[test]
    fn test_validation_rejects_negative_profile_and_default_timestamp() {
        let mut s = sample();
        s.profile_id = -1;
        assert_eq!(s.validate(), Err(SampleError::ProfileId(-1)));

        let mut s = sample();
        s.timestamp = DateTime::<Utc>::default();
        assert!(matches!(s.validate(), Err(SampleError::Timestamp(_))));
    }

    #[test]
    fn test_to_record() {
        assert_eq!(
            sample().to_record(),
            "2024-03-01T12:00:00.000000Z,1.5,-0.25,18,4,19.5,10"
        );
    }

    #[test]
    fn test_missing_timestamp_deserializes_to_default() {
        let json = r#"{"iq":1.0,"id":0.5,"coolant":20.0,"profileId":2,"ambient":21.0}"#;
        let s: MotorSample = serde_json::from_str(json).unwrap();
        assert_eq!(s.timestamp, DateTime::<Utc>::default());
        assert_eq!(s.torque, 0.0);
        assert!(s.validate().is_err());
    }
}
