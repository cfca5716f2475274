use colored::{control, ColoredString, Colorize};

use crate::core::formatter::{
    format_gb, format_percent, format_unread, format_usage_bar, text_or_na,
};
use crate::core::models::record::AggregatedRecord;

const BAR_WIDTH: usize = 12;
const WARN_PERCENT: f64 = 75.0;
const CRITICAL_PERCENT: f64 = 90.0;

fn colorize_percent(text: String, percent: Option<f64>) -> ColoredString {
    match percent {
        Some(p) if p >= CRITICAL_PERCENT => text.red(),
        Some(p) if p >= WARN_PERCENT => text.yellow(),
        Some(_) => text.green(),
        None => text.dimmed(),
    }
}

/// Render one mailbox block.
///
/// Layout:
/// ```text
///  Ana Torres
///   Account   ana@contoso.com
///   Email     ana@contoso.com
///   Unread    12
///   Usage     10% [█░░░░░░░░░░░]
///   Storage   1 GB / 10 GB
/// ```
pub fn render_record(record: &AggregatedRecord, use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines: Vec<String> = Vec::new();
    lines.push(
        format!(" {}", text_or_na(record.display_name.as_deref()))
            .bold()
            .to_string(),
    );
    lines.push(format!(
        "  {}   {}",
        "Account".cyan(),
        text_or_na(record.user_principal_name.as_deref())
    ));
    lines.push(format!(
        "  {}     {}",
        "Email".cyan(),
        text_or_na(record.email.as_deref())
    ));
    lines.push(format!(
        "  {}    {}",
        "Unread".cyan(),
        format_unread(record.unread_count)
    ));

    let usage = match record.usage_percentage {
        Some(p) => format!("{} {}", format_percent(Some(p)), format_usage_bar(p, BAR_WIDTH)),
        None => format_percent(None),
    };
    lines.push(format!(
        "  {}     {}",
        "Usage".cyan(),
        colorize_percent(usage, record.usage_percentage)
    ));
    lines.push(format!(
        "  {}   {} / {}",
        "Storage".cyan(),
        format_gb(record.storage_used_gb),
        format_gb(record.quota_gb)
    ));

    lines.join("\n")
}

/// One line per record: "- ana@contoso.com: 10%".
pub fn render_summary(records: &[AggregatedRecord], use_color: bool) -> String {
    control::set_override(use_color);

    let mut lines = vec!["Mailbox usage summary:".bold().to_string()];
    for record in records {
        lines.push(format!(
            "- {}: {}",
            text_or_na(record.user_principal_name.as_deref()),
            colorize_percent(
                format_percent(record.usage_percentage),
                record.usage_percentage
            )
        ));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> AggregatedRecord {
        AggregatedRecord {
            display_name: Some("Ana Torres".into()),
            user_principal_name: Some("ana@contoso.com".into()),
            email: None,
            unread_count: None,
            usage_percentage: Some(10.0),
            storage_used_gb: Some(1.0),
            quota_gb: Some(10.0),
        }
    }

    #[test]
    fn render_record_plain() {
        let text = render_record(&record(), false);
        assert!(text.contains(" Ana Torres"));
        assert!(text.contains("Email     N/A"));
        assert!(text.contains("Unread    unknown"));
        assert!(text.contains("10% [█░░░░░░░░░░░]"));
        assert!(text.contains("1 GB / 10 GB"));
    }

    #[test]
    fn render_record_without_usage() {
        let mut r = record();
        r.usage_percentage = None;
        r.storage_used_gb = None;
        r.quota_gb = None;
        let text = render_record(&r, false);
        assert!(text.contains("Usage     N/A"));
        assert!(text.contains("N/A / N/A"));
    }

    #[test]
    fn render_summary_lines() {
        let mut other = record();
        other.user_principal_name = Some("bo@contoso.com".into());
        other.usage_percentage = None;
        let text = render_summary(&[record(), other], false);
        assert!(text.contains("- ana@contoso.com: 10%"));
        assert!(text.contains("- bo@contoso.com: N/A"));
    }
}
