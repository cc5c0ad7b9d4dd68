// Motor service - session lifecycle, validation, anomaly detection and persistence
use crate::application::observer::SessionObserver;
use crate::application::session_sink::{SessionSink, SinkError, SinkProvider};
use crate::domain::detector::SessionState;
use crate::domain::sample::MotorSample;
use crate::domain::session::{Ack, AckStatus, SessionConfig, SessionEvent, SessionSummary};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// One Active period: statistics plus the logs they are written to
struct ActiveSession {
    state: SessionState,
    sink: Box<dyn SessionSink>,
}

/// The anomaly engine behind the start/submit/end boundary.
///
/// A single mutex serializes all three operations, so none of them ever
/// observes another half-way through. Log writes, closes and observer
/// notifications all happen under it, so events reach observers in the
/// order the engine produced them. Observers must not block.
pub struct MotorService {
    sinks: Arc<dyn SinkProvider>,
    observers: Vec<Arc<dyn SessionObserver>>,
    session: Mutex<Option<ActiveSession>>,
}

impl MotorService {
    pub fn new(sinks: Arc<dyn SinkProvider>) -> Self {
        Self {
            sinks,
            observers: Vec::new(),
            session: Mutex::new(None),
        }
    }

    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observers.push(observer);
        self
    }

    fn lock(&self) -> MutexGuard<'_, Option<ActiveSession>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self, event: SessionEvent) {
        for observer in &self.observers {
            observer.notify(&event);
        }
    }

    #[cfg(test)]
    pub fn is_active(&self) -> bool {
        self.lock().is_some()
    }

    pub fn start(&self, mut config: SessionConfig) -> Ack {
        let mut session = self.lock();

        if let Err(e) = config.validate() {
            tracing::warn!(error = %e, "rejected session config");
            return Ack::fail(e.to_string(), AckStatus::Nack);
        }

        if config.session_id.trim().is_empty() {
            config.session_id = Uuid::new_v4().simple().to_string();
        }

        let sink = match self.sinks.open(&config.session_id) {
            Ok(sink) => sink,
            Err(e) => {
                tracing::error!(session_id = %config.session_id, error = %e, "failed to open session logs");
                return Ack::fail(e.to_string(), AckStatus::Nack);
            }
        };

        if let Some(mut previous) = session.take() {
            tracing::warn!(
                session_id = previous.state.session_id(),
                "replacing a session that was never ended"
            );
            if let Err(e) = previous.sink.close() {
                tracing::warn!(error = %e, "failed to close replaced session logs");
            }
        }

        let storage = sink.location();
        *session = Some(ActiveSession {
            state: SessionState::new(config.clone()),
            sink,
        });

        self.publish(SessionEvent::Started {
            session_id: config.session_id.clone(),
            storage,
            config,
        });
        Ack::ok("Session started", AckStatus::InProgress)
    }

    pub fn submit(&self, sample: MotorSample) -> Ack {
        let mut guard = self.lock();
        let Some(active) = guard.as_mut() else {
            tracing::warn!("sample received but no session is active");
            return Ack::fail("Session not started", AckStatus::Nack);
        };

        match Self::process(active, &sample) {
            Ok(events) => {
                for event in events {
                    self.publish(event);
                }
                Ack::ok("OK", AckStatus::InProgress)
            }
            Err(rejection) => {
                let reason = rejection.to_string();
                if let Err(e) = active.sink.record_reject(&reason, &sample.to_record()) {
                    tracing::error!(error = %e, "failed to write reject log");
                }
                self.publish(SessionEvent::SampleRejected {
                    reason: reason.clone(),
                });
                Ack::fail(reason, AckStatus::InProgress)
            }
        }
    }

    /// Runs one sample through validation, persistence and detection.
    /// Statistics are only touched once the measurement is safely logged.
    fn process(
        active: &mut ActiveSession,
        sample: &MotorSample,
    ) -> Result<Vec<SessionEvent>, Rejection> {
        sample.validate().map_err(|e| Rejection::Invalid(e.to_string()))?;

        active
            .sink
            .record_measurement(sample)
            .map_err(Rejection::Write)?;
        let accepted_count = active.state.record_accepted();

        let alerts = active.state.observe(sample);
        tracing::debug!(
            samples = active.state.sample_count(),
            coolant_mean = active.state.running_coolant_mean(),
            alerts = alerts.len(),
            "sample processed"
        );
        let mut events = Vec::with_capacity(alerts.len() + 1);
        for alert in alerts {
            active.sink.record_alert(&alert).map_err(Rejection::Other)?;
            events.push(SessionEvent::AlertRaised(alert));
        }

        events.push(SessionEvent::SampleAccepted {
            accepted_count,
            sample: sample.clone(),
        });
        Ok(events)
    }

    pub fn end(&self) -> Ack {
        let mut guard = self.lock();
        let Some(mut active) = guard.take() else {
            return Ack::fail("No active session", AckStatus::Nack);
        };

        if let Err(e) = active.sink.close() {
            tracing::warn!(error = %e, "error while closing session logs");
        }

        let summary = SessionSummary {
            session_id: active.state.session_id().to_string(),
            accepted_count: active.state.accepted_count(),
        };
        self.publish(SessionEvent::Completed(summary.clone()));
        Ack::completed(summary)
    }
}

/// Why a submitted sample was not taken
#[derive(Debug, thiserror::Error)]
enum Rejection {
    #[error("{0}")]
    Invalid(String),
    #[error("write error: {0}")]
    Write(SinkError),
    #[error("{0}")]
    Other(SinkError),
}
