use serde::Deserialize;

use crate::core::graph::{Endpoints, FailureKind, GraphError, Transport, ACCEPT_JSON};
use crate::core::models::detail::{DetailResult, Profile, UnavailableReason};

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct InboxResponse {
    unread_item_count: Option<serde_json::Value>,
}

fn unread_from(inbox: InboxResponse) -> Option<u64> {
    inbox.unread_item_count.and_then(|v| v.as_u64())
}

/// Retrieves profile and unread count for one subject.
///
/// The two lookups have separate failure domains: the profile decides whether
/// the subject appears at all, the inbox only decides the unread count.
pub struct DetailFetcher<'a> {
    transport: &'a dyn Transport,
    endpoints: &'a Endpoints,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(transport: &'a dyn Transport, endpoints: &'a Endpoints) -> Self {
        Self {
            transport,
            endpoints,
        }
    }

    pub async fn fetch(&self, user_id: &str) -> DetailResult {
        let profile = match self.profile(user_id).await {
            Ok(profile) => profile,
            Err(e) => return self.profile_failure(user_id, &e),
        };

        let label = profile.user_principal_name.as_deref().unwrap_or(user_id);
        let unread_count = match self.unread_count(user_id).await {
            Ok(count) => count,
            Err(e) => {
                log_inbox_failure(label, &e);
                None
            }
        };

        DetailResult::Resolved {
            profile,
            unread_count,
        }
    }

    async fn profile(&self, user_id: &str) -> Result<Profile, GraphError> {
        self.transport
            .get(&self.endpoints.profile(user_id), ACCEPT_JSON)
            .await?
            .decode()
    }

    async fn unread_count(&self, user_id: &str) -> Result<Option<u64>, GraphError> {
        let inbox: InboxResponse = self
            .transport
            .get(&self.endpoints.inbox(user_id), ACCEPT_JSON)
            .await?
            .decode()?;
        Ok(unread_from(inbox))
    }

    fn profile_failure(&self, user_id: &str, err: &GraphError) -> DetailResult {
        let reason = match err.kind() {
            FailureKind::NotEnabled => {
                tracing::warn!(
                    user = user_id,
                    "Mailbox not enabled for the REST API (on-premises or inactive); \
                     mailbox details unavailable"
                );
                return DetailResult::Resolved {
                    profile: Profile {
                        user_principal_name: Some(user_id.to_string()),
                        ..Profile::default()
                    },
                    unread_count: None,
                };
            }
            FailureKind::NotFound => {
                tracing::warn!(user = user_id, "User has no mailbox or was not found");
                UnavailableReason::NotFound
            }
            FailureKind::AccessDenied => {
                tracing::error!(
                    user = user_id,
                    error = %err,
                    "Access denied reading user profile (check User.Read.All / MailboxSettings.Read)"
                );
                UnavailableReason::AccessDenied
            }
            FailureKind::Unknown => {
                tracing::error!(user = user_id, error = %err, "Failed to fetch user profile");
                UnavailableReason::UnknownError
            }
        };
        DetailResult::Unavailable(reason)
    }
}

fn log_inbox_failure(label: &str, err: &GraphError) {
    match err.kind() {
        FailureKind::NotEnabled => tracing::warn!(
            user = label,
            "Mailbox not enabled for the REST API; unread count unavailable"
        ),
        FailureKind::NotFound => tracing::warn!(user = label, "Inbox not found"),
        FailureKind::AccessDenied => tracing::warn!(
            user = label,
            error = %err,
            "Access denied reading unread count (check Mail.Read)"
        ),
        FailureKind::Unknown => {
            tracing::error!(user = label, error = %err, "Failed to fetch unread count")
        }
    }
}
