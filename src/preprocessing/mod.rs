// Preprocessing - temporal trimming, re-gridding and event segmentation
//
// Module organization:
// - resample: duration trimming and frequency re-gridding (linear interpolation)
// - segment: impact localisation and pre-event/event/post-event splitting

pub mod resample;
pub mod segment;

pub use resample::{resample_to_frequency, trim_to_duration};
pub use segment::{
    inspection_window, locate_peak, segment_fall, FallPhases, Segment, SegmentRole, Segmentation,
    Segmenter,
};
