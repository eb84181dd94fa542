pub mod session;
pub mod settings;

pub use settings::{AdminCredentials, AdminPassword, ConfigError, GoogleConfig, Settings};
