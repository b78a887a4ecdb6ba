//! End-to-end pipeline tests on synthetic recordings
//!
//! Falls are quiet signals with one short, large impact followed by a level
//! shift; ADLs are slow sinusoids. Both are 2 s at 200 Hz on the three
//! primary accelerometer axes.

use fall_bench::config::ExperimentConfig;
use fall_bench::error::{BenchError, DatasetError, PreprocessingError};
use fall_bench::evaluation::{ClassifierKind, FoldScores, ScalingMode};
use fall_bench::{ClassificationMode, Experiment, Recording, Signal};
use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const SAMPLES: usize = 400;
const PERIOD_MS: f64 = 5.0;
/// Wide enough to survive re-gridding at 20 Hz
const IMPACT_SAMPLES: usize = 12;

fn accelerometer_channels() -> Vec<String> {
    ["acc_x", "acc_y", "acc_z"].iter().map(|s| s.to_string()).collect()
}

fn fall(rng: &mut StdRng, trial: usize) -> Recording {
    let peak = rng.gen_range(150..250);
    let data = Array2::from_shape_fn((SAMPLES, 3), |(i, c)| {
        let noise = rng.gen_range(-0.05..0.05);
        let base = if c == 2 { 1.0 } else { 0.0 };
        if (peak..peak + IMPACT_SAMPLES).contains(&i) {
            8.0 + noise
        } else if i > peak {
            base * 0.2 + 0.8 + noise
        } else {
            base + noise
        }
    });
    let signal = Signal::uniform(accelerometer_channels(), PERIOD_MS, data).unwrap();
    Recording::new("SA01", "F01", &format!("R{:02}", trial), signal)
}

fn adl(rng: &mut StdRng, trial: usize) -> Recording {
    let phase: f64 = rng.gen_range(0.0..std::f64::consts::PI);
    let data = Array2::from_shape_fn((SAMPLES, 3), |(i, c)| {
        let t = i as f64 * PERIOD_MS / 1000.0;
        0.5 * (2.0 * std::f64::consts::PI * t + phase + c as f64).sin()
    });
    let signal = Signal::uniform(accelerometer_channels(), PERIOD_MS, data).unwrap();
    Recording::new("SA02", "D07", &format!("R{:02}", trial), signal)
}

fn recordings(per_class: usize) -> Vec<Recording> {
    let mut rng = StdRng::seed_from_u64(2024);
    (0..per_class)
        .flat_map(|trial| [fall(&mut rng, trial), adl(&mut rng, trial)])
        .collect()
}

fn small_config() -> ExperimentConfig {
    let mut config = ExperimentConfig::default();
    config.acquisition.sensor_axes = vec![0, 1, 2];
    config.preprocessing.duration_ms = 2000;
    config.preprocessing.frequencies_hz = vec![20, 50];
    config.preprocessing.pre_time_ms = 150;
    config.preprocessing.post_time_ms = 50;
    config.evaluation.models = vec![ClassifierKind::Knn, ClassifierKind::DecisionTree];
    config.evaluation.k_fold = 3;
    config
}

#[test]
fn binary_pipeline_separates_falls() {
    let config = small_config();
    let experiment = Experiment::new(config).unwrap();
    let report = experiment.run(&recordings(12)).unwrap();

    assert_eq!(report.class_names, vec!["ADL", "Fall"]);
    // 2 frequencies × 2 models × 3 folds
    assert_eq!(report.records.len(), 12);
    assert_eq!(report.summaries.len(), 4);

    let first = &report.records[0];
    assert_eq!(first.frequency_hz, 20);
    assert_eq!(first.model, ClassifierKind::Knn);
    assert_eq!(first.fold, 1);
    assert_eq!(first.confusion_matrix.len(), 2);

    for summary in &report.summaries {
        assert_eq!(summary.folds, 3);
        assert!(
            summary.mean.accuracy >= 0.9,
            "{} at {} Hz: accuracy {}",
            summary.model,
            summary.frequency_hz,
            summary.mean.accuracy
        );
    }
    assert!(report.best_frequency("accuracy").is_some());
}

#[test]
fn multi_class_pipeline_scores_four_classes() {
    let mut config = small_config();
    config.preprocessing.classification = ClassificationMode::MultiClass;
    config.preprocessing.frequencies_hz = vec![50];
    config.evaluation.scaling = ScalingMode::GlobalLeaky;

    let report = Experiment::new(config).unwrap().run(&recordings(9)).unwrap();

    assert_eq!(report.class_names.len(), 4);
    assert_eq!(report.records.len(), 6);
    for record in &report.records {
        assert_eq!(record.confusion_matrix.len(), 4);
        // 9 ADL rows + 9 rows per fall phase, one third held out
        let held_out: usize = record.confusion_matrix.iter().flatten().sum();
        assert_eq!(held_out, 12);
        for value in record.scores.values() {
            assert!((0.0..=1.0).contains(&value), "{:?}", record.scores);
        }
    }
    assert_eq!(FoldScores::METRIC_NAMES.len(), report.records[0].metrics_map().len());
}

#[test]
fn sequential_and_parallel_runs_agree() {
    let data = recordings(6);
    let mut config = small_config();
    config.preprocessing.frequencies_hz = vec![20];
    config.evaluation.models = vec![ClassifierKind::RandomForest];

    config.evaluation.parallel = false;
    let sequential = Experiment::new(config.clone()).unwrap().run(&data).unwrap();
    config.evaluation.parallel = true;
    let parallel = Experiment::new(config).unwrap().run(&data).unwrap();

    for (a, b) in sequential.records.iter().zip(&parallel.records) {
        assert_eq!(a.fold, b.fold);
        assert_eq!(a.scores, b.scores);
        assert_eq!(a.confusion_matrix, b.confusion_matrix);
    }
}

#[test]
fn short_recording_aborts_the_frequency() {
    let mut data = recordings(6);
    let short = Array2::from_elem((100, 3), 0.5);
    data.push(Recording::new(
        "SA03",
        "D08",
        "R01",
        Signal::uniform(accelerometer_channels(), PERIOD_MS, short).unwrap(),
    ));

    let err = Experiment::new(small_config()).unwrap().run(&data).unwrap_err();
    match err {
        BenchError::Dataset(DatasetError::Recording {
            recording, source, ..
        }) => {
            assert_eq!(recording, "SA03/D08/R01");
            assert!(matches!(source, PreprocessingError::InvalidDuration { .. }));
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn too_few_examples_per_class_fails() {
    let mut config = small_config();
    config.evaluation.k_fold = 5;
    let err = Experiment::new(config).unwrap().run(&recordings(3)).unwrap_err();
    assert!(matches!(err, BenchError::Evaluation(_)));
}
