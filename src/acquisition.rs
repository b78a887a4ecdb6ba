// Acquisition - SisFall dataset discovery and parsing
//
// Layout: `<root>/<subject>/<activity>_<subject>_<trial>.txt`, one
// directory per subject. Each row holds nine raw ADC counts separated by
// commas and terminated by `;`. Counts are converted to physical units per
// sensor group and the selected axes are kept in configured order.

use std::collections::HashSet;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, Trim};
use ndarray::Array2;

use crate::config::{AcquisitionConfig, NATIVE_RATE_HZ};
use crate::error::{log_acquisition_error, AcquisitionError};
use crate::signal::{Recording, SensorAxis, Signal};

/// Activities recorded as one long trial and cut into fixed windows
pub const WINDOWED_ACTIVITIES: [&str; 4] = ["D01", "D02", "D03", "D04"];
/// First sample of every window of a windowed activity
pub const WINDOW_STARTS: [usize; 5] = [1000, 5000, 9000, 13000, 17000];
/// Samples per window
pub const WINDOW_LEN: usize = 2000;

const RAW_COLUMNS: usize = 9;

/// Reads SisFall recordings from disk
#[derive(Debug, Clone)]
pub struct SisFallLoader {
    axes: Vec<SensorAxis>,
    ignored_subjects: HashSet<String>,
}

impl SisFallLoader {
    pub fn new(axes: Vec<SensorAxis>, ignored_subjects: impl IntoIterator<Item = String>) -> Self {
        Self {
            axes,
            ignored_subjects: ignored_subjects.into_iter().collect(),
        }
    }

    /// # Errors
    /// `InvalidAxis` for an axis index outside 0..=8
    pub fn from_config(config: &AcquisitionConfig) -> Result<Self, AcquisitionError> {
        let axes = config
            .sensor_axes
            .iter()
            .map(|&index| SensorAxis::from_index(index).ok_or(AcquisitionError::InvalidAxis { index }))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(axes, config.ignored_subjects.iter().cloned()))
    }

    pub fn axes(&self) -> &[SensorAxis] {
        &self.axes
    }

    /// Load every recording under the dataset root
    ///
    /// Subjects and files are visited in sorted name order. Ignored subjects
    /// and non-directories are skipped, as are files not ending in `.txt`.
    ///
    /// # Errors
    /// * `Io` if a directory or file cannot be read
    /// * `Parse` for a malformed row
    /// * `EmptyDataset` if nothing was loaded
    pub fn load_dataset(&self, root: impl AsRef<Path>) -> Result<Vec<Recording>, AcquisitionError> {
        let root = root.as_ref();
        let mut recordings = Vec::new();

        for subject_dir in sorted_entries(root)? {
            let Some(subject) = file_name(&subject_dir) else {
                continue;
            };
            if self.ignored_subjects.contains(&subject) || !subject_dir.is_dir() {
                continue;
            }

            let before = recordings.len();
            for file in sorted_entries(&subject_dir)? {
                let is_txt = file.extension().map_or(false, |ext| ext == "txt");
                if is_txt && file.is_file() {
                    let loaded = self.load_file(&file, &subject).map_err(|err| {
                        log_acquisition_error(&err, "SisFallLoader::load_dataset");
                        err
                    })?;
                    recordings.extend(loaded);
                }
            }
            tracing::debug!(
                "[SisFallLoader] {}: {} recordings",
                subject,
                recordings.len() - before
            );
        }

        if recordings.is_empty() {
            return Err(AcquisitionError::EmptyDataset {
                root: root.to_path_buf(),
            });
        }

        let falls = recordings.iter().filter(|r| r.is_fall()).count();
        tracing::info!(
            "[SisFallLoader] Loaded {} recordings ({} falls, {} ADLs) from {:?}",
            recordings.len(),
            falls,
            recordings.len() - falls,
            root
        );
        Ok(recordings)
    }

    /// Load the recordings contained in one activity file
    ///
    /// Windowed activities yield one recording per window start that lies
    /// inside the file; every other activity yields exactly one.
    pub fn load_file(&self, path: &Path, subject: &str) -> Result<Vec<Recording>, AcquisitionError> {
        let name = file_name(path).unwrap_or_default();
        let activity = name.get(..3).unwrap_or(name.as_str()).to_string();
        let trial = name.get(9..12).unwrap_or_default().to_string();
        let signal = self.read_file(path)?;

        if !WINDOWED_ACTIVITIES.contains(&activity.as_str()) {
            return Ok(vec![Recording::new(subject, &activity, &trial, signal)]);
        }

        let mut windows = Vec::with_capacity(WINDOW_STARTS.len());
        for (window, &start) in WINDOW_STARTS.iter().enumerate() {
            let part = signal.slice(start..start + WINDOW_LEN);
            if part.is_empty() {
                tracing::warn!(
                    "[SisFallLoader] {:?} has {} samples, window {} starting at {} is empty",
                    path,
                    signal.len(),
                    window,
                    start
                );
                continue;
            }
            let data = part.data().to_owned();
            let rebased = Signal::uniform(part.channels().to_vec(), signal.period_ms(), data)
                .map_err(|err| parse_error(path, start, err.to_string()))?;

            let mut recording = Recording::new(subject, &activity, &trial, rebased);
            recording.window = Some(window);
            windows.push(recording);
        }
        Ok(windows)
    }

    /// Read one activity file into a signal of the selected axes
    ///
    /// # Errors
    /// * `Io` if the file cannot be opened
    /// * `Parse` for a row without nine numeric values, or an empty file
    pub fn read_file(&self, path: &Path) -> Result<Signal, AcquisitionError> {
        let file = File::open(path).map_err(|err| AcquisitionError::io(path, err))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(file);

        let mut values: Vec<f64> = Vec::new();
        let mut rows = 0;
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(|err| parse_error(path, row + 1, err.to_string()))?;
            let fields: Vec<&str> = record
                .iter()
                .map(|field| field.trim_end_matches(';').trim())
                .filter(|field| !field.is_empty())
                .collect();
            if fields.is_empty() {
                continue;
            }
            if fields.len() < RAW_COLUMNS {
                return Err(parse_error(
                    path,
                    row + 1,
                    format!("expected {} values, found {}", RAW_COLUMNS, fields.len()),
                ));
            }

            for axis in &self.axes {
                let raw = fields[axis.index()];
                let count: f64 = raw
                    .parse()
                    .map_err(|_| parse_error(path, row + 1, format!("'{}' is not a number", raw)))?;
                values.push(count * axis.group().conversion_factor());
            }
            rows += 1;
        }

        if rows == 0 {
            return Err(parse_error(path, 0, "file contains no samples".to_string()));
        }

        let data = Array2::from_shape_vec((rows, self.axes.len()), values)
            .map_err(|err| parse_error(path, rows, err.to_string()))?;
        let channels = self.axes.iter().map(|a| a.name().to_string()).collect();
        Signal::uniform(channels, 1000.0 / NATIVE_RATE_HZ as f64, data)
            .map_err(|err| parse_error(path, rows, err.to_string()))
    }
}

fn parse_error(path: &Path, row: usize, reason: String) -> AcquisitionError {
    AcquisitionError::Parse {
        path: path.to_path_buf(),
        row,
        reason,
    }
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

/// Directory entries sorted by name
fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, AcquisitionError> {
    let mut entries = fs::read_dir(dir)
        .map_err(|err| AcquisitionError::io(dir, err))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| AcquisitionError::io(dir, err))?;
    entries.sort();
    Ok(entries)
}
