mod answers;
mod catalog;
mod ids;
mod item;
mod lenient;
mod submission;

pub use answers::{CodeSubmission, QuizAnswer};
pub use catalog::{Difficulty, ProblemSummary, QuizSummary, TestSetDetail};
pub use ids::{CandidateId, ItemId, ParseIdError, SubmissionId, TestSetId};
pub use item::{ItemKind, ItemMeta, ItemStatus};
pub use submission::{StoredSubmission, TestSetSubmission};
