// Segmenter - impact localisation and fall phase splitting
//
// The impact instant is the sample with the largest Euclidean norm across
// all channels. Around it, a fall is split into pre-event, event and
// post-event windows whose half-widths are fractions of the signal length.
// Boundary correction keeps at least one sample in every phase.

use std::ops::Range;

use serde::Serialize;

use crate::error::PreprocessingError;
use crate::signal::Signal;

/// Role of a segment within its recording
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentRole {
    WholeActivity,
    PreEvent,
    Event,
    PostEvent,
}

/// Contiguous sub-range of a signal tagged with its role
#[derive(Debug, Clone)]
pub struct Segment {
    pub role: SegmentRole,
    pub range: Range<usize>,
    pub signal: Signal,
}

impl Segment {
    fn new(role: SegmentRole, range: Range<usize>, source: &Signal) -> Self {
        Self {
            role,
            signal: source.slice(range.clone()),
            range,
        }
    }

    pub fn len(&self) -> usize {
        self.range.len()
    }

    pub fn is_empty(&self) -> bool {
        self.range.is_empty()
    }
}

/// The three phases of a fall recording
#[derive(Debug, Clone)]
pub struct FallPhases {
    pub pre_event: Segment,
    pub event: Segment,
    pub post_event: Segment,
    /// Index of the impact sample
    pub peak: usize,
}

/// Outcome of segmenting one recording
#[derive(Debug, Clone)]
pub enum Segmentation {
    /// Non-fall recording kept whole
    Activity(Segment),
    /// Fall recording split around the impact
    Fall(FallPhases),
}

impl Segmentation {
    /// Segments in labelling order: activity (or event) first, then
    /// pre-event and post-event for falls
    pub fn segments(&self) -> Vec<&Segment> {
        match self {
            Segmentation::Activity(segment) => vec![segment],
            Segmentation::Fall(phases) => {
                vec![&phases.event, &phases.pre_event, &phases.post_event]
            }
        }
    }
}

/// Index of the sample with maximal Euclidean norm (first on ties)
///
/// # Errors
/// `EmptySignal` if the signal has no samples.
pub fn locate_peak(signal: &Signal) -> Result<usize, PreprocessingError> {
    if signal.is_empty() {
        return Err(PreprocessingError::EmptySignal);
    }

    let mut peak = 0;
    let mut best = f64::NEG_INFINITY;
    for (i, value) in signal.magnitude().into_iter().enumerate() {
        if value > best {
            best = value;
            peak = i;
        }
    }
    Ok(peak)
}

/// Split a fall recording into pre-event/event/post-event
///
/// With peak `i` and length `n`:
/// `low = max(0, i - floor(n × pre_fraction))`,
/// `high = min(n, i + floor(n × post_fraction))`, then `low` is raised to 1
/// when it is 0 and `high` is lowered by one when it equals `n`.
///
/// # Errors
/// `DegenerateSegment` if the event window ends up empty.
pub fn segment_fall(
    signal: &Signal,
    pre_fraction: f64,
    post_fraction: f64,
) -> Result<FallPhases, PreprocessingError> {
    let len = signal.len();
    let peak = locate_peak(signal)?;

    let size_low = (len as f64 * pre_fraction).max(0.0).floor() as usize;
    let size_high = (len as f64 * post_fraction).max(0.0).floor() as usize;

    let mut low = peak.saturating_sub(size_low);
    let mut high = peak.saturating_add(size_high).min(len);

    if low == 0 {
        low += 1;
    }
    if high == len {
        high -= 1;
    }

    if low >= high {
        return Err(PreprocessingError::DegenerateSegment { low, high, len });
    }

    Ok(FallPhases {
        pre_event: Segment::new(SegmentRole::PreEvent, 0..low, signal),
        event: Segment::new(SegmentRole::Event, low..high, signal),
        post_event: Segment::new(SegmentRole::PostEvent, high..len, signal),
        peak,
    })
}

/// Scale turning inspection event times (ms) into fractions of the length
pub const INSPECTION_TIME_SCALE_MS: usize = 10_000;

/// Impact window drawn when inspecting one recording
///
/// With peak `i` and length `n`:
/// `low = max(0, i - n × pre_time_ms / 10000)`,
/// `high = min(n, i + n × post_time_ms / 10000)` in integer arithmetic and
/// without boundary correction, so the outer phases may be empty.
///
/// # Returns
/// The peak index and the `low..high` event range
///
/// # Errors
/// `EmptySignal` if the signal has no samples.
pub fn inspection_window(
    signal: &Signal,
    pre_time_ms: u32,
    post_time_ms: u32,
) -> Result<(usize, Range<usize>), PreprocessingError> {
    let len = signal.len();
    let peak = locate_peak(signal)?;

    let size_low = len * pre_time_ms as usize / INSPECTION_TIME_SCALE_MS;
    let size_high = len * post_time_ms as usize / INSPECTION_TIME_SCALE_MS;
    let low = peak.saturating_sub(size_low);
    let high = peak.saturating_add(size_high).min(len);

    Ok((peak, low..high))
}

/// Fall segmentation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segmenter {
    pre_fraction: f64,
    post_fraction: f64,
}

impl Segmenter {
    pub fn new(pre_fraction: f64, post_fraction: f64) -> Self {
        Self {
            pre_fraction,
            post_fraction,
        }
    }

    /// Build from pre/post event times in milliseconds
    ///
    /// The times are divided by 1000 and used directly as fractions of the
    /// signal length, independent of the recording's actual duration.
    pub fn from_event_times_ms(pre_time_ms: f64, post_time_ms: f64) -> Self {
        Self::new(pre_time_ms / 1000.0, post_time_ms / 1000.0)
    }

    pub fn pre_fraction(&self) -> f64 {
        self.pre_fraction
    }

    pub fn post_fraction(&self) -> f64 {
        self.post_fraction
    }

    /// Segment a recording; non-falls are returned whole
    pub fn segment(&self, signal: &Signal, is_fall: bool) -> Result<Segmentation, PreprocessingError> {
        if !is_fall {
            if signal.is_empty() {
                return Err(PreprocessingError::EmptySignal);
            }
            return Ok(Segmentation::Activity(Segment::new(
                SegmentRole::WholeActivity,
                0..signal.len(),
                signal,
            )));
        }

        segment_fall(signal, self.pre_fraction, self.post_fraction).map(Segmentation::Fall)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array2;
    use proptest::prelude::*;

    fn signal_from(data: Array2<f64>) -> Signal {
        let names = (0..data.ncols()).map(|c| format!("ch{}", c)).collect();
        Signal::uniform(names, 5.0, data).unwrap()
    }

    /// Low-level noise-free baseline with a single spike
    fn spike_signal(len: usize, channels: usize, at: usize) -> Signal {
        let mut data = Array2::from_elem((len, channels), 0.1);
        data.row_mut(at).fill(5.0);
        signal_from(data)
    }

    #[test]
    fn test_locate_peak_finds_spike() {
        let signal = spike_signal(100, 3, 42);
        assert_eq!(locate_peak(&signal).unwrap(), 42);
    }

    #[test]
    fn test_locate_peak_first_occurrence_on_ties() {
        let mut data = Array2::zeros((10, 2));
        data[[3, 0]] = 2.0;
        data[[7, 1]] = 2.0;
        assert_eq!(locate_peak(&signal_from(data)).unwrap(), 3);
    }

    #[test]
    fn test_locate_peak_uses_norm_across_channels() {
        let mut data = Array2::zeros((10, 3));
        data[[2, 0]] = 3.0; // norm 3
        data[[6, 0]] = -2.0;
        data[[6, 1]] = 2.0;
        data[[6, 2]] = 2.0; // norm ~3.46
        assert_eq!(locate_peak(&signal_from(data)).unwrap(), 6);
    }

    #[test]
    fn test_segment_fall_reference_example() {
        let signal = spike_signal(2000, 3, 1000);
        let phases = segment_fall(&signal, 0.15, 0.05).unwrap();
        assert_eq!(phases.peak, 1000);
        assert_eq!(phases.event.range, 700..1100);
        assert_eq!(phases.pre_event.range, 0..700);
        assert_eq!(phases.post_event.range, 1100..2000);
        assert_eq!(phases.event.signal.len(), 400);
        assert_eq!(phases.event.role, SegmentRole::Event);
    }

    #[test]
    fn test_segment_fall_boundary_correction() {
        let signal = spike_signal(100, 3, 0);
        let phases = segment_fall(&signal, 0.2, 2.0).unwrap();
        assert_eq!(phases.pre_event.range, 0..1);
        assert_eq!(phases.event.range, 1..99);
        assert_eq!(phases.post_event.range, 99..100);
    }

    #[test]
    fn test_segment_fall_degenerate() {
        let signal = spike_signal(2, 1, 0);
        assert!(matches!(
            segment_fall(&signal, 0.1, 0.1),
            Err(PreprocessingError::DegenerateSegment { len: 2, .. })
        ));
    }

    #[test]
    fn test_segmenter_from_event_times() {
        let segmenter = Segmenter::from_event_times_ms(150.0, 50.0);
        assert_eq!(segmenter.pre_fraction(), 0.15);
        assert_eq!(segmenter.post_fraction(), 0.05);

        let signal = spike_signal(2000, 3, 1000);
        match segmenter.segment(&signal, true).unwrap() {
            Segmentation::Fall(phases) => assert_eq!(phases.event.range, 700..1100),
            other => panic!("expected fall phases, got {:?}", other),
        }
    }

    #[test]
    fn test_inspection_window_default_times() {
        let signal = spike_signal(2000, 3, 1000);
        let (peak, window) = inspection_window(&signal, 1500, 500).unwrap();
        assert_eq!(peak, 1000);
        assert_eq!(window, 700..1100);
    }

    #[test]
    fn test_inspection_window_clamps_without_correction() {
        let signal = spike_signal(100, 3, 0);
        let (_, window) = inspection_window(&signal, 1500, 20_000).unwrap();
        assert_eq!(window, 0..100);

        assert!(matches!(
            inspection_window(&signal.slice(0..0), 1500, 500),
            Err(PreprocessingError::EmptySignal)
        ));
    }

    #[test]
    fn test_non_fall_kept_whole() {
        let signal = spike_signal(50, 3, 10);
        let segmentation = Segmenter::new(0.1, 0.1).segment(&signal, false).unwrap();
        let segments = segmentation.segments();
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].role, SegmentRole::WholeActivity);
        assert_eq!(segments[0].range, 0..50);
    }

    proptest! {
        #[test]
        fn prop_phases_cover_signal(
            len in 3usize..400,
            peak_frac in 0.0f64..1.0,
            pre in 0.0f64..0.6,
            post in 0.0f64..0.6,
        ) {
            let at = ((len - 1) as f64 * peak_frac) as usize;
            let signal = spike_signal(len, 3, at);
            match segment_fall(&signal, pre, post) {
                Ok(phases) => {
                    let total = phases.pre_event.len() + phases.event.len() + phases.post_event.len();
                    prop_assert_eq!(total, len);
                    prop_assert!(phases.pre_event.len() >= 1);
                    prop_assert!(phases.event.len() >= 1);
                    prop_assert!(phases.post_event.len() >= 1);
                }
                Err(err) => {
                    let is_degenerate = matches!(err, PreprocessingError::DegenerateSegment { .. });
                    prop_assert!(is_degenerate);
                }
            }
        }

        #[test]
        fn prop_peak_is_scale_invariant(
            values in proptest::collection::vec(-10.0f64..10.0, 3..90),
            scale in 0.01f64..100.0,
        ) {
            let rows = values.len() / 3;
            let data = Array2::from_shape_vec((rows, 3), values[..rows * 3].to_vec()).unwrap();
            let scaled = data.mapv(|v| v * scale);
            prop_assert_eq!(
                locate_peak(&signal_from(data)).unwrap(),
                locate_peak(&signal_from(scaled)).unwrap()
            );
        }
    }
}
