/// Модели: адаптер артефакта, предсказание, описательная статистика

pub mod adapter;
pub mod aggregation;
pub mod linear_pipeline;
pub mod prediction;

pub use adapter::{r2_score, ModelAdapter, RegressionModel};
pub use aggregation::{DescriptiveAggregator, GroupKey};
pub use linear_pipeline::LinearPipelineModel;
pub use prediction::PredictionPipeline;
