//! Сквозные проверки: датасет -> признаки -> модель -> предсказание

use std::path::PathBuf;
use std::sync::Arc;

use approx::assert_relative_eq;
use bike_demand::{
    Dataset, DemandError, DemandTier, DescriptiveAggregator, FeatureEngineer, FeatureFrame,
    GroupKey, LinearPipelineModel, ModelAdapter, PredictionPipeline, RawInputs, Weekday,
    WeatherSituation,
};

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn load() -> (Dataset, ModelAdapter) {
    let dataset = Dataset::load(fixture("day.csv")).unwrap();
    let model = LinearPipelineModel::load(fixture("model.json")).unwrap();
    (dataset, ModelAdapter::new(model))
}

#[test]
fn score_over_full_dataset() {
    let (dataset, adapter) = load();
    let (frame, targets) = FeatureEngineer::design_matrix(dataset.records());

    assert_eq!(frame.nrows(), 16);
    let score = adapter.score(&frame, &targets.to_vec()).unwrap();
    assert_relative_eq!(score, 0.708_748_380_199_546, epsilon = 1e-9);
}

#[test]
fn batch_and_single_derivation_agree() {
    let (dataset, adapter) = load();
    let batch = FeatureEngineer::derive_batch(dataset.records());

    for (record, row) in dataset.records().iter().zip(&batch) {
        assert_eq!(*row, FeatureEngineer::derive(&record.raw_inputs()));
    }

    let batch_predictions = adapter.predict(&FeatureFrame::from_rows(&batch)).unwrap();
    let single = adapter
        .predict(&FeatureFrame::from_rows(&batch[9..10]))
        .unwrap();
    assert_eq!(batch_predictions[9], single[0]);
}

#[test]
fn interactive_predictions_across_tiers() {
    let (dataset, adapter) = load();
    let mean = DescriptiveAggregator::new(&dataset).summary().mean_count;
    assert_relative_eq!(mean, 3967.875);

    let pipeline = PredictionPipeline::new(Arc::new(adapter), mean);

    let typical = pipeline.predict(&RawInputs::default()).unwrap();
    assert_relative_eq!(typical.prediction, 4350.0, epsilon = 1e-9);
    assert_eq!(typical.tier, DemandTier::Medium);
    assert_relative_eq!(typical.delta, 382.125, epsilon = 1e-9);

    let storm = pipeline
        .predict(&RawInputs {
            yr: 0,
            weathersit: WeatherSituation::HeavyPrecipitation,
            temp: 0.05,
            hum: 0.95,
            windspeed: 0.5,
            ..RawInputs::default()
        })
        .unwrap();
    assert_eq!(storm.prediction, 0.0);
    assert_eq!(storm.tier, DemandTier::Low);

    let sunny = pipeline
        .predict(&RawInputs {
            temp: 0.9,
            hum: 0.3,
            windspeed: 0.1,
            ..RawInputs::default()
        })
        .unwrap();
    assert_relative_eq!(sunny.prediction, 6850.0, epsilon = 1e-9);
    assert_eq!(sunny.tier, DemandTier::High);

    let weekend = pipeline
        .predict(&RawInputs {
            weekday: Weekday::Saturday,
            workingday: false,
            ..RawInputs::default()
        })
        .unwrap();
    assert_relative_eq!(weekend.prediction, 4150.0, epsilon = 1e-9);
}

#[test]
fn frame_missing_a_feature_is_rejected() {
    let (_, adapter) = load();
    let row = FeatureEngineer::derive(&RawInputs::default());
    let frame = FeatureFrame::from_rows(&[row]).without_column("temp_hum_interaction");

    assert!(matches!(
        adapter.predict(&frame),
        Err(DemandError::SchemaMismatch { .. })
    ));
    assert!(matches!(
        adapter.score(&frame, &[1.0]),
        Err(DemandError::SchemaMismatch { .. })
    ));
}

#[test]
fn fixture_groupings_recombine_to_total() {
    let (dataset, _) = load();
    let aggregator = DescriptiveAggregator::new(&dataset);
    let summary = aggregator.summary();
    assert_eq!(summary.total_count, 63486);
    assert_eq!((summary.min_count, summary.max_count), (801, 7577));

    let seasons = aggregator.group_by(GroupKey::Season);
    assert_eq!(seasons.len(), 2);
    assert_eq!(seasons[0].label, "Spring");
    assert_eq!(seasons[0].days, 8);
    assert_eq!(seasons[1].label, "Summer");

    for key in [GroupKey::Season, GroupKey::Weekday, GroupKey::Weather] {
        let total: f64 = aggregator
            .group_by(key)
            .iter()
            .map(|g| g.days as f64 * g.mean_count)
            .sum();
        assert_relative_eq!(total, 63486.0, epsilon = 1e-6);
    }

    let matrix = aggregator.correlation_matrix();
    let r = matrix.get("registered", "cnt").unwrap();
    assert!(r > 0.9, "registered/cnt correlation {}", r);
    assert_eq!(matrix.get("holiday", "cnt"), None);
}
