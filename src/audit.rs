use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::entity::sea_orm_active_enums::RoleType;

/// Already-verified identity of whoever triggered an operation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub username: String,
    pub display_name: String,
    pub role: RoleType,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuditEvent {
    pub actor_id: Uuid,
    pub actor_role: RoleType,
    pub action: &'static str,
    pub entity_type: &'static str,
    pub entity_id: Uuid,
    pub entity_name: String,
    pub changes: Option<String>,
}

impl AuditEvent {
    pub fn new(actor: &Actor, action: &'static str, entity_type: &'static str, entity_id: Uuid, entity_name: impl Into<String>) -> Self {
        Self {
            actor_id: actor.id,
            actor_role: actor.role,
            action,
            entity_type,
            entity_id,
            entity_name: entity_name.into(),
            changes: None,
        }
    }

    pub fn with_changes(mut self, changes: impl Into<String>) -> Self {
        self.changes = Some(changes.into());
        self
    }
}

/// Fire-and-forget audit trail; implementations swallow their own failures
pub trait AuditSink {
    fn record(&self, event: AuditEvent);
}

pub struct TracingAudit;

impl AuditSink for TracingAudit {
    fn record(&self, event: AuditEvent) {
        info!(
            target: "audit",
            actor_id = %event.actor_id,
            actor_role = ?event.actor_role,
            action = event.action,
            entity_type = event.entity_type,
            entity_id = %event.entity_id,
            entity_name = %event.entity_name,
            changes = event.changes.as_deref(),
            "audit"
        );
    }
}

#[cfg(test)]
pub mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct RecordingAudit(pub Mutex<Vec<AuditEvent>>);

    impl RecordingAudit {
        pub fn actions(&self) -> Vec<&'static str> {
            self.0.lock().unwrap().iter().map(|e| e.action).collect()
        }
    }

    impl AuditSink for RecordingAudit {
        fn record(&self, event: AuditEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    pub fn admin() -> Actor {
        Actor {
            id: Uuid::new_v4(),
            username: "admin".to_owned(),
            display_name: "Administrator".to_owned(),
            role: RoleType::Admin,
        }
    }

    #[test]
    fn test_event_builder() {
        let actor = admin();
        let id = Uuid::new_v4();

        let event = AuditEvent::new(&actor, "approve", "payroll", id, "Bob 2025-06").with_changes("draft -> approved");

        assert_eq!(event.actor_id, actor.id);
        assert_eq!(event.actor_role, RoleType::Admin);
        assert_eq!(event.changes.as_deref(), Some("draft -> approved"));

        TracingAudit.record(event);
    }
}
