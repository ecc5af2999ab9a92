mod runner;
mod service;
mod view;
mod workflow;

// Public API of the taking subsystem.
pub use crate::error::SessionError;
pub use runner::{RunnerCommand, RunnerHandle, SessionRunner};
pub use service::{ItemClick, SubmitReason, TestSetSession, TickOutcome};
pub use view::SessionSnapshot;
pub use workflow::TestSetTakingService;
