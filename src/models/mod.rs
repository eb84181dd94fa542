pub mod campaign;
pub mod oauth;
pub mod user;

pub use campaign::{
    Campaign, CampaignDetails, CampaignRow, CampaignStatus, CampaignSubscriber,
    CampaignSubscriberRow, CreateCampaignRequest, ExecutionSummary, NewCampaign, SubscriberStatus,
};
pub use oauth::{ConsentRequest, ProviderProfile, TokenGrant};
pub use user::{AuthorizationStatus, SubscriptionRecord, User, UserDetails, UserProfile};
