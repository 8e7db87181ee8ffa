pub const REFERENCE_CONFIG: &'static str = include_str!("../reference.toml");

pub mod clock;
pub mod config;
pub mod error;
pub mod ext;
pub mod failure_detector;
pub mod util;
