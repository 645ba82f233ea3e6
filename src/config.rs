/// Настройки сервиса из переменных окружения

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::error::{DemandError, Result};

pub const DATA_PATH_VAR: &str = "BIKE_DEMAND_DATA";
pub const MODEL_PATH_VAR: &str = "BIKE_DEMAND_MODEL";
pub const BIND_ADDR_VAR: &str = "BIKE_DEMAND_ADDR";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub data_path: PathBuf,
    pub model_path: PathBuf,
    pub bind_addr: SocketAddr,
}

fn default_data_path() -> PathBuf { PathBuf::from("day.csv") }
fn default_model_path() -> PathBuf { PathBuf::from("bike_sharing_model.json") }
fn default_bind_addr() -> SocketAddr { SocketAddr::from(([0, 0, 0, 0], 8000)) }

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_path: default_data_path(),
            model_path: default_model_path(),
            bind_addr: default_bind_addr(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let data_path = lookup(DATA_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_data_path);
        let model_path = lookup(MODEL_PATH_VAR)
            .map(PathBuf::from)
            .unwrap_or_else(default_model_path);

        let bind_addr = match lookup(BIND_ADDR_VAR) {
            Some(addr) => addr.parse::<SocketAddr>().map_err(|e| {
                DemandError::InvalidConfig(format!("{}={:?}: {}", BIND_ADDR_VAR, addr, e))
            })?,
            None => default_bind_addr(),
        };

        Ok(Self {
            data_path,
            model_path,
            bind_addr,
        })
    }
}
