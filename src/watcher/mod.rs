pub mod alert;
pub mod controller;
pub mod session;

pub use alert::{AlertAttempt, AlertGate};
pub use controller::{PageWatcher, ScanOutcome};
pub use session::PollingSession;
