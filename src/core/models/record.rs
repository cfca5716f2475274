use serde::{Deserialize, Serialize};

/// One consolidated row of the mailbox usage report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedRecord {
    pub display_name: Option<String>,
    pub user_principal_name: Option<String>,
    pub email: Option<String>,
    pub unread_count: Option<u64>,
    /// Storage used as a percentage of the send/receive quota, two decimals
    pub usage_percentage: Option<f64>,
    #[serde(rename = "storageUsedFormattedGB")]
    pub storage_used_gb: Option<f64>,
    #[serde(rename = "quotaFormattedGB")]
    pub quota_gb: Option<f64>,
}
