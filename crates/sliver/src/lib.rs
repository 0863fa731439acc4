//! Cut packages into slices.
//!
//! Slices name the paths they want from a package and the content they add
//! on their own. [`run`] merges the selected slices, extracts what they need
//! from every package and returns the completed record of what was produced.
//!
//! # Architecture
//!
//! - `slice.rs` - Slice definitions
//! - `selection.rs` - Merged path selection and per-package targets
//! - `run.rs` - Extraction, synthesized content and mutation

pub use error::{Error, Result};
pub use run::{MutateContext, Mutator, RunOptions, run};
pub use selection::{Claim, Claims, Selection};
pub use slice::{PathInfo, Slice};

pub use sliver_manifest::{JsonLinesSink, ManifestSink, PathRecord, PathRecorder};

mod error;
mod run;
mod selection;
mod slice;
