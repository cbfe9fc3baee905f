use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Context keys shared by the campaign steps.
pub mod keys {
    pub const CAMPAIGN_ID: &str = "campaign_id";
    pub const CREDITS: &str = "credits";
    pub const RECIPIENTS: &str = "recipients";
    pub const RESERVATION_ID: &str = "reservation_id";
    pub const EMAIL_BATCH_ID: &str = "email_batch_id";
    pub const PREVIOUS_STATUS: &str = "previous_status";
    pub const ANALYTICS_ID: &str = "analytics_id";
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CampaignId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CampaignStatus {
    #[default]
    Draft,
    Scheduled,
    Sending,
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Draft => "draft",
            Self::Scheduled => "scheduled",
            Self::Sending => "sending",
        };
        f.write_str(label)
    }
}

/// Everything the campaign launch saga needs up front.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub campaign_id: CampaignId,
    /// Credits to hold for the send; one per recipient unless set otherwise.
    pub credits: u64,
    pub recipients: Vec<String>,
}

impl LaunchRequest {
    #[must_use]
    pub fn new(campaign_id: CampaignId, recipients: Vec<String>) -> Self {
        Self {
            campaign_id,
            credits: recipients.len() as u64,
            recipients,
        }
    }

    #[must_use]
    pub fn with_credits(mut self, credits: u64) -> Self {
        self.credits = credits;
        self
    }

    /// Initial saga context for this launch.
    #[must_use]
    pub fn to_context(&self) -> IndexMap<String, Value> {
        let mut data = IndexMap::new();
        data.insert(keys::CAMPAIGN_ID.to_string(), json!(self.campaign_id));
        data.insert(keys::CREDITS.to_string(), json!(self.credits));
        data.insert(keys::RECIPIENTS.to_string(), json!(self.recipients));
        data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credits_default_to_recipient_count() {
        let request = LaunchRequest::new(
            CampaignId::new("c-1"),
            vec!["a@example.com".to_string(), "b@example.com".to_string()],
        );

        assert_eq!(request.credits, 2);
        assert_eq!(request.with_credits(10).credits, 10);
    }

    #[test]
    fn context_carries_request_fields() {
        let request = LaunchRequest::new(CampaignId::new("c-1"), vec!["a@example.com".to_string()]);

        let data = request.to_context();

        assert_eq!(data.get(keys::CAMPAIGN_ID), Some(&json!("c-1")));
        assert_eq!(data.get(keys::CREDITS), Some(&json!(1)));
        assert_eq!(data.get(keys::RECIPIENTS), Some(&json!(["a@example.com"])));
    }

    #[test]
    fn status_serializes_snake_case() -> anyhow::Result<()> {
        assert_eq!(serde_json::to_value(CampaignStatus::Sending)?, json!("sending"));
        assert_eq!(CampaignStatus::Scheduled.to_string(), "scheduled");
        Ok(())
    }
}
