//! Bike Demand - прогноз дневного спроса на прокат велосипедов

pub mod config;
pub mod dataset;
pub mod error;
pub mod models;
pub mod preprocessing;
pub mod server;
pub mod types;

pub use dataset::Dataset;
pub use error::{DemandError, Result};
pub use models::*;
pub use preprocessing::*;
pub use types::*;
