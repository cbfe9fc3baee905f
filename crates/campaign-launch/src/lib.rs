//! Campaign launch saga: hold credits, enqueue emails, mark the campaign as
//! sending and open an analytics record, undoing each on failure.

pub mod error;
pub mod providers;
pub mod saga;
pub mod steps;
pub mod traits;
pub mod types;

pub use error::{CampaignError, Result};
pub use saga::{CampaignServices, SAGA_NAME, campaign_launch_saga, launch_campaign};
pub use steps::{
    CreateAnalyticsStep, EnqueueEmailsStep, ReserveCreditsStep, UpdateCampaignStatusStep,
};
pub use types::{CampaignId, CampaignStatus, LaunchRequest, keys};
