// Fall Bench - fall vs. ADL classifier benchmark on wearable-sensor recordings
// Batch pipeline: resample -> segment -> extract features -> cross-validate -> score

// Module declarations
pub mod acquisition;
pub mod analysis;
pub mod config;
pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod experiment;
pub mod preprocessing;
pub mod signal;

// Re-exports for convenience
pub use acquisition::SisFallLoader;
pub use config::ExperimentConfig;
pub use dataset::{ClassificationMode, DatasetBuilder, FeatureTable};
pub use error::{BenchError, ErrorCode};
pub use evaluation::{ClassifierKind, CrossValidationEngine, MetricsEvaluator, ScoreRecord};
pub use experiment::{Experiment, ExperimentReport};
pub use signal::{Recording, SensorAxis, Signal};

use tracing::Level;

/// Install the global fmt subscriber writing to stderr
///
/// `log` records from dependencies are forwarded as well. Calling this
/// twice is harmless; the second call is ignored.
///
/// # Arguments
/// * `verbose` - DEBUG level when set, INFO otherwise
pub fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let _ = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_twice() {
        init_logging(false);
        init_logging(true);
        tracing::info!("[Test] logging initialised");
    }
}
