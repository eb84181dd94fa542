pub mod campaign_repository;
pub mod user_repository;

pub use campaign_repository::{CampaignRepository, SqliteCampaignRepository};
pub use user_repository::{
    NewUser, RepositoryError, RepositoryResult, SqliteUserRepository, UserRepository,
};

#[cfg(test)]
pub use campaign_repository::MockCampaignRepository;
#[cfg(test)]
pub use user_repository::MockUserRepository;
