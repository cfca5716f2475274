use anyhow::{Context, Result};

use crate::cli::output::{OutputFormat, OutputOptions};
use crate::cli::renderer;
use crate::core::auth::{ClientCredentials, StaticToken, TokenProvider};
use crate::core::config::AppConfig;
use crate::core::engine::Aggregator;
use crate::core::graph::http::HttpTransport;
use crate::core::models::record::AggregatedRecord;

/// Keep only records whose quota is known, the set worth reporting on.
pub fn with_known_quota(records: Vec<AggregatedRecord>) -> Vec<AggregatedRecord> {
    records.into_iter().filter(|r| r.quota_gb.is_some()).collect()
}

fn token_provider(config: &AppConfig) -> Result<Box<dyn TokenProvider>> {
    if let Some(token) = StaticToken::from_env() {
        tracing::debug!("Using pre-issued access token from the environment");
        return Ok(Box::new(token));
    }
    Ok(Box::new(ClientCredentials::from_settings(&config.auth)?))
}

pub async fn run(config: &AppConfig, only_with_quota: bool, opts: &OutputOptions) -> Result<()> {
    let issues = config.validate();
    if !issues.is_empty() {
        anyhow::bail!("Invalid configuration:\n  {}", issues.join("\n  "));
    }

    let access_token = token_provider(config)?
        .access_token()
        .await
        .context("Failed to obtain an access token")?;
    let transport = HttpTransport::new(access_token, config.request_timeout())?;

    let records = Aggregator::new(&transport, config.run_options())
        .run()
        .await
        .context("Failed to aggregate mailbox usage")?;
    let records = if only_with_quota {
        with_known_quota(records)
    } else {
        records
    };

    if records.is_empty() {
        eprintln!("No mailboxes found, or their information could not be retrieved.");
        return Ok(());
    }

    match opts.format {
        OutputFormat::Text => {
            let mut sections: Vec<String> = records
                .iter()
                .map(|r| renderer::render_record(r, opts.use_color))
                .collect();
            sections.push(renderer::render_summary(&records, opts.use_color));
            println!("{}", sections.join("\n\n"));
        }
        OutputFormat::Json => {
            let json = if opts.pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            println!("{}", json);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(upn: &str, quota_gb: Option<f64>) -> AggregatedRecord {
        AggregatedRecord {
            display_name: None,
            user_principal_name: Some(upn.into()),
            email: None,
            unread_count: None,
            usage_percentage: None,
            storage_used_gb: None,
            quota_gb,
        }
    }

    #[test]
    fn with_known_quota_filters_and_keeps_order() {
        let records = vec![
            record("a@x.com", Some(50.0)),
            record("b@x.com", None),
            record("c@x.com", Some(0.0)),
        ];
        let kept: Vec<_> = with_known_quota(records)
            .into_iter()
            .filter_map(|r| r.user_principal_name)
            .collect();
        assert_eq!(kept, ["a@x.com", "c@x.com"]);
    }

    #[test]
    fn json_uses_report_field_names() {
        let mut r = record("a@x.com", Some(10.0));
        r.usage_percentage = Some(10.0);
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["userPrincipalName"], "a@x.com");
        assert_eq!(json["usagePercentage"], 10.0);
        assert_eq!(json["quotaFormattedGB"], 10.0);
        assert!(json["storageUsedFormattedGB"].is_null());
        assert!(json["unreadCount"].is_null());
    }
}
