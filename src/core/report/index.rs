use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use super::parser::Row;

/// Column names read from each report row.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportColumns {
    pub key: String,
    pub storage_used: String,
    pub quota: String,
    pub refreshed_at: String,
}

impl Default for ReportColumns {
    fn default() -> Self {
        Self {
            key: "User Principal Name".into(),
            storage_used: "Storage Used (Byte)".into(),
            quota: "Prohibit Send/Receive Quota (Byte)".into(),
            refreshed_at: "Report Refresh Date".into(),
        }
    }
}

/// The freshest report row seen for one key. Byte counts are kept as
/// reported; parsing happens when records are derived.
#[derive(Debug, Clone, PartialEq)]
pub struct UsageEntry {
    pub refreshed_at: Option<DateTime<Utc>>,
    pub storage_used: String,
    pub quota: String,
}

/// Key to usage lookup, at most one entry per key.
#[derive(Debug, Clone, Default)]
pub struct UsageIndex {
    entries: HashMap<String, UsageEntry>,
}

impl UsageIndex {
    pub fn build(rows: impl IntoIterator<Item = Row>, columns: &ReportColumns) -> Self {
        let mut entries: HashMap<String, UsageEntry> = HashMap::new();

        for row in rows {
            let Some(key) = row.get(&columns.key).filter(|k| !k.is_empty()) else {
                continue;
            };
            let (Some(storage_used), Some(quota)) =
                (row.get(&columns.storage_used), row.get(&columns.quota))
            else {
                continue;
            };
            let refreshed_at = row
                .get(&columns.refreshed_at)
                .and_then(|s| parse_refresh_date(s));

            // Ties keep the first row; an unparseable date never wins over a parseable one.
            let newer = match entries.get(key) {
                Some(existing) => refreshed_at > existing.refreshed_at,
                None => true,
            };
            if newer {
                entries.insert(
                    key.clone(),
                    UsageEntry {
                        refreshed_at,
                        storage_used: storage_used.clone(),
                        quota: quota.clone(),
                    },
                );
            }
        }

        Self { entries }
    }

    pub fn lookup(&self, key: &str) -> Option<&UsageEntry> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Accepts RFC 3339 timestamps, `YYYY-MM-DDTHH:MM:SS` and plain `YYYY-MM-DD`
/// (taken as midnight UTC).
pub fn parse_refresh_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.and_utc());
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
