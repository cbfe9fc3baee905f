mod analytics;
mod faults;
mod ledger;
mod queue;
mod status;

pub use analytics::InMemoryAnalyticsSink;
pub use faults::FaultPlan;
pub use ledger::InMemoryCreditLedger;
pub use queue::InMemoryMessageQueue;
pub use status::InMemoryCampaignStatusStore;
