//! Signal detection and the board of latest detections.

pub mod board;
pub mod detector;

pub use board::{BoardEntry, SignalBoard};
pub use detector::SignalDetector;
