pub mod checkin;
pub mod events;
pub mod issuance;
pub mod retry;

pub use checkin::{Admission, CheckInOutcome, CheckInService};
pub use events::EventService;
pub use issuance::{IssuanceService, Issued};
pub use retry::RetryPolicy;
