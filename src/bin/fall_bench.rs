use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use fall_bench::config::ExperimentConfig;
use fall_bench::evaluation::{ClassifierKind, FoldScores, MetricSummary, ScoreRecord};
use fall_bench::preprocessing::{inspection_window, trim_to_duration};
use fall_bench::{init_logging, BenchError, ClassificationMode, Experiment, ExperimentReport, SisFallLoader};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "fall_bench",
    about = "Benchmark fall vs. ADL classifiers on the SisFall dataset"
)]
struct Cli {
    /// Log at DEBUG level
    #[arg(long, short, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the full experiment over a SisFall dataset directory
    Run {
        /// Root of the SisFall dataset (one directory per subject)
        dataset: PathBuf,
        /// JSON experiment configuration (defaults when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Directory receiving results.json and scores.csv
        #[arg(long, default_value = "results")]
        output: PathBuf,
        /// Override the target frequencies, e.g. `--frequencies 10,50`
        #[arg(long, value_delimiter = ',')]
        frequencies: Option<Vec<u32>>,
        /// Override the evaluated models, e.g. `--models knn,rf`
        #[arg(long, value_delimiter = ',')]
        models: Option<Vec<ClassifierKind>>,
        /// Override the number of folds
        #[arg(long)]
        k_fold: Option<usize>,
        /// Label falls as pre-fall, fall and post-fall phases
        #[arg(long)]
        multi_class: bool,
        /// Evaluate folds on the calling thread only
        #[arg(long)]
        sequential: bool,
    },
    /// Report the impact peak and phase boundaries of one recording
    Inspect {
        /// One SisFall activity file
        file: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        /// Sensor axes to read (0..=8), accelerometer x/y/z unless configured
        #[arg(long, value_delimiter = ',')]
        sensors: Option<Vec<usize>>,
        /// Write the JSON report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Print the default configuration as JSON
    DefaultConfig {
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli.command) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            match err.downcast_ref::<BenchError>() {
                Some(BenchError::InvalidConfig(_)) => ExitCode::from(2),
                _ => ExitCode::from(1),
            }
        }
    }
}

fn run(command: Commands) -> Result<ExitCode> {
    match command {
        Commands::Run {
            dataset,
            config,
            output,
            frequencies,
            models,
            k_fold,
            multi_class,
            sequential,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(frequencies) = frequencies {
                config.preprocessing.frequencies_hz = frequencies;
            }
            if let Some(models) = models {
                config.evaluation.models = models;
            }
            if let Some(k_fold) = k_fold {
                config.evaluation.k_fold = k_fold;
            }
            if multi_class {
                config.preprocessing.classification = ClassificationMode::MultiClass;
            }
            if sequential {
                config.evaluation.parallel = false;
            }
            run_experiment(config, &dataset, &output)
        }
        Commands::Inspect {
            file,
            config,
            sensors,
            output,
        } => {
            let mut config = match config {
                Some(path) => ExperimentConfig::from_file_strict(path)?,
                None => {
                    let mut config = ExperimentConfig::default();
                    config.acquisition.sensor_axes = INSPECT_SENSOR_AXES.to_vec();
                    config
                }
            };
            if let Some(sensors) = sensors {
                config.acquisition.sensor_axes = sensors;
            }
            run_inspect(config, &file, output)
        }
        Commands::DefaultConfig { output } => {
            emit_json(&ExperimentConfig::default(), output)?;
            Ok(ExitCode::from(0))
        }
    }
}

/// Axes read by `inspect` when no configuration is given
const INSPECT_SENSOR_AXES: [usize; 3] = [0, 1, 2];

fn load_config(path: Option<&Path>) -> Result<ExperimentConfig> {
    match path {
        Some(path) => ExperimentConfig::from_file_strict(path),
        None => Ok(ExperimentConfig::default()),
    }
}

fn run_experiment(config: ExperimentConfig, dataset: &Path, output: &Path) -> Result<ExitCode> {
    let experiment = Experiment::new(config)?;
    let loader = SisFallLoader::from_config(&experiment.config().acquisition)?;
    let recordings = loader
        .load_dataset(dataset)
        .with_context(|| format!("loading dataset {}", dataset.display()))?;

    let report = experiment.run(&recordings)?;

    fs::create_dir_all(output).with_context(|| format!("creating {}", output.display()))?;
    let results_path = output.join("results.json");
    fs::write(&results_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("writing {}", results_path.display()))?;
    write_scores_csv(&output.join("scores.csv"), &report.records)?;

    print_summary(&report);
    Ok(ExitCode::from(0))
}

fn write_scores_csv(path: &Path, records: &[ScoreRecord]) -> Result<()> {
    let mut writer =
        csv::Writer::from_path(path).with_context(|| format!("creating {}", path.display()))?;

    let mut header = vec!["frequency_hz", "abbreviation", "name", "fold"];
    header.extend(FoldScores::METRIC_NAMES);
    header.extend(["fit_time_s", "predict_time_s"]);
    writer.write_record(&header)?;

    for record in records {
        let mut row = vec![
            record.frequency_hz.to_string(),
            record.model.abbreviation().to_string(),
            record.name.clone(),
            record.fold.to_string(),
        ];
        row.extend(record.scores.values().iter().map(|v| v.to_string()));
        row.push(record.fit_time_s.to_string());
        row.push(record.predict_time_s.to_string());
        writer.write_record(&row)?;
    }
    writer.flush()?;
    Ok(())
}

fn print_summary(report: &ExperimentReport) {
    print!("{:>8} {:<5}", "rate_hz", "model");
    for name in FoldScores::METRIC_NAMES {
        print!(" {:>17}", name);
    }
    println!();

    for summary in &report.summaries {
        print_summary_row(summary);
    }

    for metric in ["accuracy", "auroc"] {
        if let Some(frequency) = report.best_frequency(metric) {
            println!("Best mean {metric}: {frequency} Hz");
        }
    }
}

fn print_summary_row(summary: &MetricSummary) {
    print!("{:>8} {:<5}", summary.frequency_hz, summary.model.abbreviation());
    for (mean, variance) in summary.mean.values().iter().zip(summary.variance.values()) {
        print!(" {:>8.4} ± {:<6.4}", mean, variance.sqrt());
    }
    println!();
}

#[derive(Serialize)]
struct InspectReport {
    file: String,
    activity: String,
    is_fall: bool,
    channels: Vec<String>,
    samples: usize,
    period_ms: f64,
    peak: usize,
    peak_time_ms: f64,
    pre_event: [usize; 2],
    event: [usize; 2],
    post_event: [usize; 2],
    timestamps_ms: Vec<f64>,
    magnitude: Vec<f64>,
}

fn run_inspect(config: ExperimentConfig, file: &Path, output: Option<PathBuf>) -> Result<ExitCode> {
    let loader = SisFallLoader::from_config(&config.acquisition)?;
    let signal = loader.read_file(file)?;
    let signal = trim_to_duration(&signal, config.preprocessing.duration_ms as f64)?;

    let (peak, event) = inspection_window(
        &signal,
        config.preprocessing.pre_time_ms,
        config.preprocessing.post_time_ms,
    )?;

    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let activity = name.get(..3).unwrap_or(name.as_str()).to_string();

    let report = InspectReport {
        file: file.display().to_string(),
        is_fall: activity.starts_with('F'),
        activity,
        channels: signal.channels().to_vec(),
        samples: signal.len(),
        period_ms: signal.period_ms(),
        peak,
        peak_time_ms: signal.timestamps_ms()[peak],
        pre_event: [0, event.start],
        event: [event.start, event.end],
        post_event: [event.end, signal.len()],
        timestamps_ms: signal.timestamps_ms().to_vec(),
        magnitude: signal.magnitude(),
    };

    emit_json(&report, output)?;
    Ok(ExitCode::from(0))
}

fn emit_json<T: Serialize>(value: &T, output_path: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;

    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    Ok(())
}
