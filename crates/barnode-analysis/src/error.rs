use thiserror::Error;
use uuid::Uuid;

/// Rejected consolidation input.
///
/// Nothing has been written when this is returned; the caller re-prompts
/// the user and plans again.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidSelection {
    #[error("selection is empty")]
    EmptySelection,

    #[error("master article {0} is not part of the selection")]
    MasterNotSelected(Uuid),

    #[error("selected article {0} is not a member of the group")]
    NotInGroup(Uuid),

    #[error("final name is empty after normalization")]
    EmptyFinalName,
}
