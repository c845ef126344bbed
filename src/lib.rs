//! Volume Compression Resize Library
//!
//! This library reads per-volume compression savings from an ONTAP cluster's
//! REST API and computes the volume size increases that give those savings
//! back as usable capacity.

pub mod lib {
    pub mod cli;
    pub mod config;
    pub mod error;
    pub mod logger;
    pub mod ontap;
    pub mod recommender;
    pub mod report;
    pub mod volume;
}

// Re-export commonly used types at the root level for convenience
pub use lib::cli::{Cli, OutputFormat, normalize_args, parse_args};
pub use lib::config::{Config, ConnectionConfig, POLL_TIMEOUT, base_url, prompt_password};
pub use lib::error::{ConfigError, OntapError, ResizeError, Result, SizingError};
pub use lib::logger::init_logger;
pub use lib::ontap::{OntapClient, VOLUME_FIELDS, VolumeRef};
pub use lib::recommender::{
    Assessment, CapacityFigures, DEFAULT_TARGET_PERCENT, Finding, GIB, Mode, Recommendation,
    Recommender, ScanOutcome, SizingPolicy, assess, capacity_figures, gib_ceil, gib_floor,
    recommended_increase_bytes,
};
pub use lib::report::{ReportOptions, ReportOutput, render_text, resize_command};
pub use lib::volume::{VolumeRecord, VolumeSnapshot, VolumeStyle};
