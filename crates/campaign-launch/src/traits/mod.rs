mod analytics_sink;
mod campaign_status_store;
mod credit_ledger;
mod message_queue;

pub use analytics_sink::AnalyticsSink;
pub use campaign_status_store::CampaignStatusStore;
pub use credit_ledger::CreditLedger;
pub use message_queue::MessageQueue;
