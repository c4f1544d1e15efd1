pub mod event;
pub mod ticket;

pub use event::{EventSettings, EventSettingsUpdate};
pub use ticket::{contact_key, CheckState, EventSnapshot, Identity, Ticket};
