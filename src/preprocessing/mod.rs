/// Модуль предобработки данных

pub mod feature_engineering;
pub mod normalization;

pub use feature_engineering::{
    FeatureEngineer, FeatureFrame, FeatureRow, FEATURE_SCHEMA, FEATURE_SCHEMA_VERSION,
};
pub use normalization::DataNormalizer;
