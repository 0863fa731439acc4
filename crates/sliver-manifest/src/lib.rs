//! Records of what a slicing run produced.
//!
//! # Architecture
//!
//! - `record.rs` - Persisted record shapes and their JSON form
//! - `recorder.rs` - Path bookkeeping during extraction and its completion
//! - `sink.rs` - Destinations for emitted records

pub use error::{Error, Result, SinkError};
pub use record::{
    ContentRecord, ManifestEntry, PackageRecord, PathRecord, Record, SliceRecord, format_mode,
    parse_mode,
};
pub use recorder::{PathRecorder, digest};
pub use sink::{JsonLinesSink, ManifestSink};

mod error;
mod record;
mod recorder;
mod sink;
