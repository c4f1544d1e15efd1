use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Registrant attributes captured when a ticket is issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub age: i32,
}

impl Identity {
    /// Copy with surrounding whitespace removed from every text field.
    pub fn trimmed(&self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            phone: self.phone.trim().to_string(),
            age: self.age,
        }
    }

    pub fn dedup_key(&self) -> String {
        contact_key(&self.email)
    }
}

/// Deduplication key for a contact address. Two registrations whose
/// addresses differ only in case or surrounding whitespace are the same
/// registrant.
pub fn contact_key(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Event details frozen into a ticket at issuance. Later edits to the event
/// settings never reach tickets that were already issued.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventSnapshot {
    pub name: String,
    pub date: String,
    pub location: String,
}

/// Check-in state. `Used` is terminal and carries the admission time, so a
/// used ticket without a timestamp cannot be represented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum CheckState {
    Unused,
    Used { at: DateTime<Utc> },
}

impl CheckState {
    pub fn is_used(&self) -> bool {
        matches!(self, CheckState::Used { .. })
    }

    pub fn checked_in_at(&self) -> Option<DateTime<Utc>> {
        match self {
            CheckState::Unused => None,
            CheckState::Used { at } => Some(*at),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Ticket {
    pub id: String,
    pub identity: Identity,
    pub event: EventSnapshot,
    pub created_at: DateTime<Utc>,
    pub check_state: CheckState,
}

impl Ticket {
    /// A freshly issued, unused ticket.
    pub fn new(
        id: String,
        identity: Identity,
        event: EventSnapshot,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            identity,
            event,
            created_at,
            check_state: CheckState::Unused,
        }
    }

    pub fn dedup_key(&self) -> String {
        self.identity.dedup_key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(email: &str) -> Identity {
        Identity {
            name: "Ana".to_string(),
            email: email.to_string(),
            phone: String::new(),
            age: 30,
        }
    }

    #[test]
    fn test_contact_key_ignores_case_and_padding() {
        assert_eq!(identity("  A@X.com ").dedup_key(), "a@x.com");
        assert_eq!(identity("a@x.com").dedup_key(), "a@x.com");
    }

    #[test]
    fn test_new_ticket_is_unused() {
        let ticket = Ticket::new(
            "TKT-1-abc".to_string(),
            identity("a@x.com"),
            EventSnapshot {
                name: "Launch".to_string(),
                date: "2025-03-15".to_string(),
                location: "Hall A".to_string(),
            },
            Utc::now(),
        );

        assert!(!ticket.check_state.is_used());
        assert_eq!(ticket.check_state.checked_in_at(), None);
    }

    #[test]
    fn test_check_state_serialization() {
        let json = serde_json::to_value(CheckState::Unused).unwrap();
        assert_eq!(json["state"], "unused");

        let at = Utc::now();
        let json = serde_json::to_value(CheckState::Used { at }).unwrap();
        assert_eq!(json["state"], "used");
        assert!(json["at"].is_string());
    }
}
