use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::graph::{validate_endpoint, Transport, ACCEPT_JSON};
use crate::core::models::subject::Subject;

#[derive(Deserialize)]
struct UserPage {
    #[serde(default)]
    value: Vec<Subject>,
    #[serde(rename = "@odata.nextLink")]
    next_link: Option<String>,
}

/// Walk the paginated `/users` listing from `first_page` until no next link
/// is returned. Any page failure aborts the walk, since a partial subject
/// list would silently under-report. Next links must be HTTPS, like every
/// other URL the bearer token is sent to.
pub async fn enumerate_subjects(transport: &dyn Transport, first_page: &str) -> Result<Vec<Subject>> {
    let mut subjects = Vec::new();
    let mut next = Some(first_page.to_string());
    let mut pages = 0usize;

    while let Some(url) = next {
        if pages > 0 {
            validate_endpoint(&url, "@odata.nextLink")
                .with_context(|| format!("Failed to list users (page {})", pages + 1))?;
        }
        let page: UserPage = transport
            .get(&url, ACCEPT_JSON)
            .await
            .and_then(|body| body.decode())
            .with_context(|| format!("Failed to list users (page {})", pages + 1))?;
        pages += 1;
        tracing::debug!(page = pages, users = page.value.len(), "Fetched user page");
        subjects.extend(page.value);
        next = page.next_link;
    }

    Ok(subjects)
}
