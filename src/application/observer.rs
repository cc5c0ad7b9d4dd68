// Session observers - the engine's only notification outlet
use crate::domain::session::SessionEvent;
use tokio::sync::broadcast;

pub trait SessionObserver: Send + Sync {
    fn notify(&self, event: &SessionEvent);
}

/// Narrates session events through tracing
#[derive(Debug, Default, Clone)]
pub struct TracingObserver;

impl SessionObserver for TracingObserver {
    fn notify(&self, event: &SessionEvent) {
        match event {
            SessionEvent::Started {
                session_id,
                storage,
                config,
            } => tracing::info!(
                session_id = %session_id,
                storage = %storage,
                iq_threshold = config.iq_threshold,
                id_threshold = config.id_threshold,
                t_threshold = config.t_threshold,
                deviation_percent = config.deviation_percent,
                "motor session started"
            ),
            SessionEvent::SampleAccepted {
                accepted_count,
                sample,
            } => {
                if *accepted_count <= 3 {
                    tracing::info!(
                        "Sample #{}: Iq={:.3}A, Id={:.3}A, Coolant={:.1}C, Torque={:.2}Nm",
                        accepted_count,
                        sample.iq,
                        sample.id,
                        sample.coolant,
                        sample.torque
                    );
                } else {
                    tracing::debug!(accepted_count, "sample accepted");
                }
            }
            SessionEvent::SampleRejected { reason } => {
                tracing::warn!(reason = %reason, "sample rejected")
            }
            SessionEvent::AlertRaised(alert) => {
                tracing::warn!(kind = %alert.kind, "ALERT: {}", alert.message)
            }
            SessionEvent::Completed(summary) => tracing::info!(
                session_id = %summary.session_id,
                accepted = summary.accepted_count,
                "motor session completed"
            ),
        }
    }
}

/// Fans events out to live `/events` subscribers
#[derive(Debug, Clone)]
pub struct BroadcastObserver {
    sender: broadcast::Sender<SessionEvent>,
}

impl BroadcastObserver {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.sender.subscribe()
    }
}

impl SessionObserver for BroadcastObserver {
    fn notify(&self, event: &SessionEvent) {
        // No subscribers is the normal case
        let _ = self.sender.send(event.clone());
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::session::SessionSummary;

    #[tokio::test]
    async fn test_broadcast_observer_delivers_to_subscribers() {
        let observer = BroadcastObserver::new(8);
        observer.notify(&SessionEvent::SampleRejected {
            reason: "nobody listening".to_string(),
        });

        let mut rx = observer.subscribe();
        let event = SessionEvent::Completed(SessionSummary {
            session_id: "abc".to_string(),
            accepted_count: 2,
        });
        observer.notify(&event);
        assert_eq!(rx.recv().await.unwrap(), event);
    }
}
