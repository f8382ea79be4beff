pub mod config;
pub mod error;
pub mod models;
pub mod services;

pub use config::Config;
pub use error::SessionError;
pub use services::session_service::{ExperimentSession, Phase};
