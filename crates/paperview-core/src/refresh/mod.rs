//! Refresh scheduling and orchestration.
//!
//! [`RefreshOrchestrator`] owns the browser session and the panel behind one
//! lock. The scheduler loop asks it for a decision pass every poll interval;
//! the control surface asks it for an immediate full refresh.

pub mod orchestrator;
pub mod retry;
pub mod schedule;
pub mod view;

pub use orchestrator::{AbandonReason, CycleOutcome, OrchestratorSnapshot, RefreshOrchestrator};
pub use retry::{Recoverable, RetryError, RetryPolicy, retry_with_recovery};
pub use schedule::{RefreshKind, RefreshSchedule};
pub use view::ViewToggle;
