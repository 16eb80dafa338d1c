//! Fire-and-forget activity events for permission mutations.
//!
//! Mutations emit an event describing what changed; a decoupled consumer
//! (typically the activity logger spawned by the embedding service) records
//! them. Event delivery is never on the mutation's correctness path: a full
//! or closed channel drops the event and the mutation still succeeds.
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use vigil_authz::{Role, UserId};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ActivityEvent {
    RolePermissionsChanged { role: Role, version: u64 },
    UserPermissionsChanged { user_id: UserId },
    SystemAdminFlagChanged { user_id: UserId },
}

#[derive(Clone)]
pub struct ActivitySender(mpsc::UnboundedSender<ActivityEvent>);

impl ActivitySender {
    /// Emit without waiting; a missing consumer only costs the record.
    pub fn emit(&self, event: ActivityEvent) {
        if self.0.send(event).is_err() {
            tracing::debug!("activity feed closed, event dropped");
        }
    }
}

pub struct ActivityFeed(mpsc::UnboundedReceiver<ActivityEvent>);

impl ActivityFeed {
    pub async fn next(&mut self) -> Option<ActivityEvent> {
        self.0.recv().await
    }
}

pub fn activity_channel() -> (ActivitySender, ActivityFeed) {
    let (tx, rx) = mpsc::unbounded_channel();
    (ActivitySender(tx), ActivityFeed(rx))
}

/// Drain the feed into structured logs until the engine is dropped.
pub fn spawn_activity_logger(mut feed: ActivityFeed) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = feed.next().await {
            match &event {
                ActivityEvent::RolePermissionsChanged { role, version } => {
                    tracing::info!(role = role.as_str(), version, "role permissions changed");
                }
                ActivityEvent::UserPermissionsChanged { user_id } => {
                    tracing::info!(user = %user_id, "user permissions changed");
                }
                ActivityEvent::SystemAdminFlagChanged { user_id } => {
                    tracing::info!(user = %user_id, "systemadmin flag changed");
                }
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_flow_through_the_channel() {
        let (tx, mut feed) = activity_channel();
        tx.emit(ActivityEvent::UserPermissionsChanged {
            user_id: UserId::new("u-1"),
        });
        let event = feed.next().await.expect("event");
        assert_eq!(
            event,
            ActivityEvent::UserPermissionsChanged {
                user_id: UserId::new("u-1"),
            }
        );
    }

    #[tokio::test]
    async fn emit_survives_a_dropped_consumer() {
        let (tx, feed) = activity_channel();
        drop(feed);
        // Must not panic or block.
        tx.emit(ActivityEvent::SystemAdminFlagChanged {
            user_id: UserId::new("u-2"),
        });
    }
}
