//! Ticket issuance and door check-in for a single-session event.
//!
//! One ticket per registrant contact address, admitted at most once no matter
//! how many stations scan it. Both guarantees are enforced by the ticket
//! store's atomic conditional operations.

pub mod codec;
pub mod config;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;
pub mod utils;
