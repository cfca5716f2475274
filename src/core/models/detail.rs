use serde::{Deserialize, Serialize};

/// Profile fields of a mailbox owner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub user_principal_name: Option<String>,
    #[serde(default)]
    pub mail: Option<String>,
}

/// Why a subject's detail could not be retrieved. Mailboxes that are not
/// enabled for the REST API still resolve, so they have no reason here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum UnavailableReason {
    NotFound,
    AccessDenied,
    UnknownError,
}

impl std::fmt::Display for UnavailableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound => write!(f, "not found"),
            Self::AccessDenied => write!(f, "access denied"),
            Self::UnknownError => write!(f, "unknown error"),
        }
    }
}

/// Outcome of detail retrieval for one subject.
#[derive(Debug, Clone, PartialEq)]
pub enum DetailResult {
    Resolved {
        profile: Profile,
        /// `None` when the inbox could not be read
        unread_count: Option<u64>,
    },
    Unavailable(UnavailableReason),
}

impl DetailResult {
    pub fn unavailable_reason(&self) -> Option<UnavailableReason> {
        match self {
            Self::Unavailable(reason) => Some(*reason),
            Self::Resolved { .. } => None,
        }
    }
}
