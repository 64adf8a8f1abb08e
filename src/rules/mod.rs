//! Real-time threshold rules.

mod window;

pub use window::{BruteForceAlert, WindowRule};
