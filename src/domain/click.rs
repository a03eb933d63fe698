//! Referral-link click records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One tracked visit through a partner's referral link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Click {
    pub id: i64,
    pub partner_id: i64,
    pub ip_address: String,
    pub user_agent: Option<String>,
    pub referrer: Option<String>,
    pub created_at: DateTime<Utc>,
}
