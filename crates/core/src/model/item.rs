use super::catalog::Difficulty;
use super::ids::ItemId;

/// Which sub-page handles an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Quiz,
    Code,
}

impl ItemKind {
    /// Path segment used in item page URLs.
    #[must_use]
    pub fn path_segment(self) -> &'static str {
        match self {
            ItemKind::Quiz => "quiz",
            ItemKind::Code => "code",
        }
    }

    #[must_use]
    pub fn from_path_segment(segment: &str) -> Option<Self> {
        match segment {
            "quiz" => Some(ItemKind::Quiz),
            "code" => Some(ItemKind::Code),
            _ => None,
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            ItemKind::Quiz => "Quiz",
            ItemKind::Code => "Coding",
        }
    }
}

/// Kind-specific details shown on an item card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ItemMeta {
    Quiz {
        question_count: u32,
        duration: Option<u32>,
    },
    Code {
        difficulty: Option<Difficulty>,
    },
}

/// One catalog item crossed with its completion flag.
///
/// Derived on every state change; never stored on its own.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemStatus {
    pub id: ItemId,
    pub kind: ItemKind,
    pub title: String,
    pub completed: bool,
    pub meta: ItemMeta,
}
