#![forbid(unsafe_code)]

pub mod countdown;
pub mod model;
pub mod phase;
pub mod time;

pub use countdown::{SessionTiming, format_remaining};
pub use phase::{PhaseContext, PhaseError, SessionPhase, SessionTrigger};
pub use time::Clock;
