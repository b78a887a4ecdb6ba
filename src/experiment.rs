// Experiment - end-to-end orchestration across rates, models and folds
//
// For every configured frequency the recordings are turned into a feature
// table, cross-validated over the configured models and scored. The
// collected score records are the handoff to reporting.

use serde::{Deserialize, Serialize};

use crate::config::ExperimentConfig;
use crate::dataset::DatasetBuilder;
use crate::error::{log_dataset_error, log_evaluation_error, BenchError};
use crate::evaluation::{
    best_frequency, summarize, CrossValidationEngine, MetricSummary, MetricsEvaluator, ScoreRecord,
};
use crate::signal::Recording;

/// Everything produced by one experiment run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentReport {
    pub config: ExperimentConfig,
    /// Class names indexed by class id
    pub class_names: Vec<String>,
    /// One record per (frequency, model, fold), in that order
    pub records: Vec<ScoreRecord>,
    /// One summary per (frequency, model)
    pub summaries: Vec<MetricSummary>,
}

impl ExperimentReport {
    /// Frequency at which the mean of `metric` across models peaks
    pub fn best_frequency(&self, metric: &str) -> Option<u32> {
        best_frequency(&self.summaries, metric)
    }
}

/// A validated experiment ready to run
pub struct Experiment {
    config: ExperimentConfig,
    builder: DatasetBuilder,
    engine: CrossValidationEngine,
    evaluator: MetricsEvaluator,
}

impl Experiment {
    /// # Errors
    /// `InvalidConfig` listing every validation failure
    pub fn new(config: ExperimentConfig) -> Result<Self, BenchError> {
        let errors = config.validate();
        if !errors.is_empty() {
            return Err(BenchError::InvalidConfig(errors));
        }

        Ok(Self {
            builder: DatasetBuilder::from_config(&config),
            engine: CrossValidationEngine::from_config(&config.evaluation),
            evaluator: MetricsEvaluator::new(config.evaluation.specificity_averaging),
            config,
        })
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    /// Run every configured frequency over the given recordings
    ///
    /// # Errors
    /// The first dataset or evaluation failure aborts the run
    pub fn run(&self, recordings: &[Recording]) -> Result<ExperimentReport, BenchError> {
        let mut records = Vec::new();

        for &frequency_hz in &self.config.preprocessing.frequencies_hz {
            let table = self
                .builder
                .build_for_frequency(recordings, frequency_hz)
                .map_err(|err| {
                    log_dataset_error(&err, "Experiment::run");
                    err
                })?;
            tracing::info!(
                "[Experiment] {} Hz: class counts {:?}",
                frequency_hz,
                table.class_counts()
            );

            let scored = self
                .engine
                .run(&table)
                .and_then(|results| self.evaluator.score_all(frequency_hz, &results))
                .map_err(|err| {
                    log_evaluation_error(&err, "Experiment::run");
                    err
                })?;
            records.extend(scored);
        }

        let summaries = summarize(&records);
        tracing::info!(
            "[Experiment] Finished: {} records, {} summaries",
            records.len(),
            summaries.len()
        );

        Ok(ExperimentReport {
            config: self.config.clone(),
            class_names: self
                .builder
                .mode()
                .class_names()
                .into_iter()
                .map(String::from)
                .collect(),
            records,
            summaries,
        })
    }
}
