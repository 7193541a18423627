pub mod controller;
pub mod wake_lock;

pub use controller::{Coordinator, CoordinatorServices, Reconciliation, TabStatus};
pub use wake_lock::{WakeLock, WakeLockState};
