//! Configuration management for portprobe.

mod settings;

pub use settings::Settings;
