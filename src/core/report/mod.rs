pub mod index;
pub mod parser;

use crate::core::graph::{Transport, ACCEPT_REPORT};

use index::{ReportColumns, UsageIndex};
use parser::{RawReport, ReportParser, Row};

const PREVIEW_ROWS: usize = 5;

/// Fetch the mailbox usage report and index it by key.
///
/// Never fails: a failed fetch or an unrecognized payload yields an empty
/// index, which leaves every usage-derived field absent.
pub async fn fetch_usage_index(
    transport: &dyn Transport,
    url: &str,
    parser: ReportParser,
    columns: &ReportColumns,
) -> UsageIndex {
    let body = match transport.get(url, ACCEPT_REPORT).await {
        Ok(body) => body,
        Err(e) if e.is_unauthorized() => {
            tracing::error!(
                error = %e,
                "Access denied fetching the mailbox usage report; the application needs the \
                 Reports.Read.All permission with admin consent"
            );
            return UsageIndex::default();
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to fetch the mailbox usage report");
            return UsageIndex::default();
        }
    };

    let Some(report) = RawReport::detect(&body.text, &columns.key) else {
        tracing::error!(
            content_type = body.content_type.as_deref().unwrap_or("unknown"),
            bytes = body.text.len(),
            "Unexpected mailbox usage report format"
        );
        return UsageIndex::default();
    };
    if matches!(report, RawReport::Delimited(_)) {
        tracing::debug!("Usage report returned as delimited text");
    }

    let mut seen = 0usize;
    let rows = parser.rows(report).inspect(|row: &Row| {
        if seen < PREVIEW_ROWS {
            tracing::debug!(
                entry = seen,
                key = ?row.get(&columns.key),
                storage_used = ?row.get(&columns.storage_used),
                quota = ?row.get(&columns.quota),
                "Usage report row"
            );
        }
        seen += 1;
    });

    let index = UsageIndex::build(rows, columns);
    tracing::debug!(rows = seen, keys = index.len(), "Usage report indexed");
    index
}
