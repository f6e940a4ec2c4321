//! Tag language identification and local/tourist classification.

pub mod classifier;
pub mod detector;

pub use classifier::{dominant_language, locality, Classification, LanguageClassifier, LanguageVote};
pub use detector::{detector_for, LanguageDetector, Prediction, ScriptDetector, WhatlangDetector};
