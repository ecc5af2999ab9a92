mod completion_vm;
mod item_form_vm;
mod taking_vm;
mod time_fmt;

pub use completion_vm::CompletionVm;
pub use item_form_vm::{CODE_LANGUAGES, QuizAnswerParseError, code_submission, parse_quiz_answers};
pub use taking_vm::{ItemCardVm, TestSetVm, map_item_cards};
pub use time_fmt::{format_datetime, format_minutes};
