//! Selective extraction of package payloads.
//!
//! # Architecture
//!
//! - `target.rs` - Source to destination mapping and its validation
//! - `options.rs` - Run configuration and observer hooks
//! - `format.rs` - `.deb` payload member codecs
//! - `extract.rs` - Streaming extraction and pending-path accounting

pub use error::{Error, HookError, Result};
pub use extract::{extract_data, extract_package};
pub use format::{Decoder, TarCompress};
pub use options::{CreateEvent, ExtractHooks, ExtractOptions, Globbed};
pub use target::{ExtractInfo, TargetSpec};

mod error;
mod extract;
mod format;
mod options;
mod target;
