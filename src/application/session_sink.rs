// Persistence traits for per-session logs
use crate::domain::alert::Alert;
use crate::domain::sample::MotorSample;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0} log is closed")]
    Closed(&'static str),
}

/// The three append-only logs of one session
pub trait SessionSink: Send {
    /// Where the logs live, for narration
    fn location(&self) -> String;

    fn record_measurement(&mut self, sample: &MotorSample) -> Result<(), SinkError>;

    /// Free-text fields are sanitized by the sink
    fn record_reject(&mut self, reason: &str, payload: &str) -> Result<(), SinkError>;

    fn record_alert(&mut self, alert: &Alert) -> Result<(), SinkError>;

    /// Flush and release the logs. Calling it twice is harmless.
    fn close(&mut self) -> Result<(), SinkError>;
}

/// Opens a fresh set of logs when a session starts
pub trait SinkProvider: Send + Sync {
    fn open(&self, session_id: &str) -> Result<Box<dyn SessionSink>, SinkError>;
}

#[cfg(test)]
pub mod testing {
    use super::*;
    use std::sync::{Arc, Mutex};

    /// What a memory sink has seen, shared with the test
    #[derive(Debug, Default)]
    pub struct Recorded {
        pub opened: Vec<String>,
        pub measurements: Vec<MotorSample>,
        pub rejects: Vec<(String, String)>,
        pub alerts: Vec<Alert>,
        pub closed: usize,
    }

    /// In-memory provider, optionally failing measurement or alert writes
    #[derive(Clone, Default)]
    pub struct MemorySinkProvider {
        pub recorded: Arc<Mutex<Recorded>>,
        pub fail_measurements: bool,
        pub fail_alerts: bool,
    }

    impl MemorySinkProvider {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn snapshot<T>(&self, f: impl FnOnce(&Recorded) -> T) -> T {
            f(&self.recorded.lock().unwrap())
        }
    }

    struct MemorySink {
        recorded: Arc<Mutex<Recorded>>,
        fail_measurements: bool,
        fail_alerts: bool,
        open: bool,
    }

    impl SessionSink for MemorySink {
        fn location(&self) -> String {
            "memory".to_string()
        }

        fn record_measurement(&mut self, sample: &MotorSample) -> Result<(), SinkError> {
            if self.fail_measurements {
                return Err(std::io::Error::other("disk full").into());
            }
            self.recorded.lock().unwrap().measurements.push(sample.clone());
            Ok(())
        }

        fn record_reject(&mut self, reason: &str, payload: &str) -> Result<(), SinkError> {
            self.recorded
                .lock()
                .unwrap()
                .rejects
                .push((reason.to_string(), payload.to_string()));
            Ok(())
        }

        fn record_alert(&mut self, alert: &Alert) -> Result<(), SinkError> {
            if self.fail_alerts {
                return Err(SinkError::Closed("alert"));
            }
            self.recorded.lock().unwrap().alerts.push(alert.clone());
            Ok(())
        }

        fn close(&mut self) -> Result<(), SinkError> {
            if self.open {
                self.open = false;
                self.recorded.lock().unwrap().closed += 1;
            }
            Ok(())
        }
    }

    impl SinkProvider for MemorySinkProvider {
        fn open(&self, session_id: &str) -> Result<Box<dyn SessionSink>, SinkError> {
            self.recorded.lock().unwrap().opened.push(session_id.to_string());
            Ok(Box::new(MemorySink {
                recorded: self.recorded.clone(),
                fail_measurements: self.fail_measurements,
                fail_alerts: self.fail_alerts,
                open: true,
            }))
        }
    }
}
