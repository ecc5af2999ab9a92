mod components;
mod done;
mod item;
mod launch;
mod scripts;
mod state;
mod taking;

#[cfg(test)]
mod test_harness;
#[cfg(test)]
mod view_smoke;

pub use components::{CompletionPanel, InvalidSession, ItemCard, ProgressSummary, TakingPanel, TimerBadge};
pub use done::DoneView;
pub use item::{CodeItemView, QuizItemView};
pub use launch::LaunchView;
pub use state::{ViewError, ViewState, view_state_from_resource};
pub use taking::TakingView;
