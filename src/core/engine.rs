use std::collections::BTreeMap;

use anyhow::Result;
use futures::stream::{self, StreamExt};

use crate::core::detail::DetailFetcher;
use crate::core::directory::enumerate_subjects;
use crate::core::formatter::{bytes_to_gb, parse_bytes, usage_percentage};
use crate::core::graph::{Endpoints, Transport};
use crate::core::models::detail::{DetailResult, UnavailableReason};
use crate::core::models::record::AggregatedRecord;
use crate::core::models::subject::Subject;
use crate::core::report::fetch_usage_index;
use crate::core::report::index::{ReportColumns, UsageEntry, UsageIndex};
use crate::core::report::parser::ReportParser;

/// Knobs for a single aggregation run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub endpoints: Endpoints,
    pub parser: ReportParser,
    pub columns: ReportColumns,
    /// Upper bound on in-flight detail fetches. `None` fans out to every
    /// subject at once.
    pub max_concurrency: Option<usize>,
}

/// Joins the user directory with the mailbox usage report.
pub struct Aggregator<'a> {
    transport: &'a dyn Transport,
    options: RunOptions,
}

impl<'a> Aggregator<'a> {
    pub fn new(transport: &'a dyn Transport, options: RunOptions) -> Self {
        Self { transport, options }
    }

    /// Produce one record per subject that has a principal name and a
    /// retrievable profile, in directory order.
    ///
    /// Only a failure to list users is returned as an error; everything else
    /// degrades individual records or fields.
    pub async fn run(&self) -> Result<Vec<AggregatedRecord>> {
        let subjects = enumerate_subjects(self.transport, &self.options.endpoints.users()).await?;
        tracing::info!(
            users = subjects.len(),
            "Fetched users; retrieving mailbox details and unread counts"
        );

        let index = fetch_usage_index(
            self.transport,
            &self.options.endpoints.usage_report(),
            self.options.parser,
            &self.options.columns,
        )
        .await;
        if index.is_empty() {
            tracing::warn!(
                "No mailbox usage data available; usage percentage and storage figures will be N/A"
            );
        }

        let candidates: Vec<&Subject> = subjects
            .iter()
            .filter(|s| s.principal_name().is_some())
            .collect();
        let details = self.fetch_details(&candidates).await;
        let skipped = skipped_by_reason(&details);
        if !skipped.is_empty() {
            let reasons: Vec<String> = skipped.iter().map(|(r, n)| format!("{r}: {n}")).collect();
            tracing::info!(
                skipped = skipped.values().sum::<usize>(),
                reasons = %reasons.join(", "),
                "Some mailboxes could not be read and are left out of the report"
            );
        }

        let records = candidates
            .into_iter()
            .zip(details)
            .filter_map(|(subject, detail)| assemble(subject, detail, &index))
            .collect();
        Ok(records)
    }

    /// Fetch every subject's detail and wait for all of them to settle.
    /// Results come back in input order either way.
    async fn fetch_details(&self, subjects: &[&Subject]) -> Vec<DetailResult> {
        let fetcher = DetailFetcher::new(self.transport, &self.options.endpoints);
        let fetches = subjects.iter().map(|s| fetcher.fetch(&s.id));

        match self.options.max_concurrency.filter(|n| *n > 0) {
            None => futures::future::join_all(fetches).await,
            Some(limit) => stream::iter(fetches).buffered(limit).collect().await,
        }
    }
}

fn skipped_by_reason(details: &[DetailResult]) -> BTreeMap<UnavailableReason, usize> {
    let mut counts = BTreeMap::new();
    for reason in details.iter().filter_map(DetailResult::unavailable_reason) {
        *counts.entry(reason).or_insert(0) += 1;
    }
    counts
}

fn assemble(subject: &Subject, detail: DetailResult, index: &UsageIndex) -> Option<AggregatedRecord> {
    let DetailResult::Resolved {
        profile,
        unread_count,
    } = detail
    else {
        return None;
    };
    let upn = subject.principal_name()?;

    let usage = derive_usage(upn, index.lookup(upn));

    Some(AggregatedRecord {
        display_name: profile.display_name,
        user_principal_name: profile.user_principal_name,
        email: profile.mail.filter(|m| !m.is_empty()),
        unread_count,
        usage_percentage: usage.percentage,
        storage_used_gb: usage.storage_used_gb,
        quota_gb: usage.quota_gb,
    })
}

#[derive(Debug, Default, PartialEq)]
struct DerivedUsage {
    percentage: Option<f64>,
    storage_used_gb: Option<f64>,
    quota_gb: Option<f64>,
}

fn derive_usage(upn: &str, entry: Option<&UsageEntry>) -> DerivedUsage {
    let Some(entry) = entry else {
        tracing::debug!(user = upn, "No usage report entry for user");
        return DerivedUsage::default();
    };

    let used = parse_bytes(&entry.storage_used);
    let quota = parse_bytes(&entry.quota);
    let percentage = usage_percentage(used, quota);
    if percentage.is_none() {
        tracing::warn!(
            user = upn,
            storage_used = %entry.storage_used,
            quota = %entry.quota,
            "Could not compute usage percentage"
        );
    }

    DerivedUsage {
        percentage,
        storage_used_gb: bytes_to_gb(used),
        quota_gb: bytes_to_gb(quota),
    }
}
