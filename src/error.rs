use thiserror::Error;

/// Why a group name was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NameError {
    #[error("group name is empty")]
    Empty,

    #[error("group name is {len} characters long (max {max})", max = crate::constants::GROUP_NAME_MAX_LEN)]
    TooLong { len: usize },

    #[error("a group named '{0}' already exists")]
    Duplicate(String),

    #[error("'{0}' is a reserved device name")]
    Reserved(String),

    #[error("group name contains forbidden character '{0}'")]
    ForbiddenChar(char),

    #[error("group name must not begin or end with whitespace or '.'")]
    BadEdge,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("'{file}' is claimed by both '{first}' and '{second}'")]
    Conflict {
        file: String,
        first: String,
        second: String,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("no plan is under review")]
    NotReviewing,

    #[error("a sort is already running")]
    AlreadyExecuting,

    #[error("nothing to review: no group has any assignment")]
    NoPlan,
}
