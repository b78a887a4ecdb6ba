// Analysis module - signal segment description
//
// Segments coming out of preprocessing are reduced to fixed-order feature
// vectors here; the dataset layer stacks those vectors into tables.

pub mod features;

pub use features::{FeatureExtractor, FeatureVector, Statistic};
