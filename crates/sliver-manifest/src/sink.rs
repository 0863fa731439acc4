use std::io::Write;

use crate::error::SinkError;
use crate::record::{ContentRecord, ManifestEntry, PathRecord};

/// Destination of the records emitted by
/// [`PathRecorder::update_db`](crate::PathRecorder::update_db).
pub trait ManifestSink {
    fn write_path(&mut self, record: &PathRecord) -> Result<(), SinkError>;

    fn write_content(&mut self, record: &ContentRecord) -> Result<(), SinkError>;
}

impl<F, E> ManifestSink for F
where
    F: FnMut(ManifestEntry<'_>) -> Result<(), E>,
    E: Into<SinkError>,
{
    fn write_path(&mut self, record: &PathRecord) -> Result<(), SinkError> {
        self(ManifestEntry::Path(record)).map_err(Into::into)
    }

    fn write_content(&mut self, record: &ContentRecord) -> Result<(), SinkError> {
        self(ManifestEntry::Content(record)).map_err(Into::into)
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesSink<W> {
    writer: W,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_entry(&mut self, entry: ManifestEntry<'_>) -> Result<(), SinkError> {
        serde_json::to_writer(&mut self.writer, &entry)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}

impl<W: Write> ManifestSink for JsonLinesSink<W> {
    fn write_path(&mut self, record: &PathRecord) -> Result<(), SinkError> {
        self.write_entry(ManifestEntry::Path(record))
    }

    fn write_content(&mut self, record: &ContentRecord) -> Result<(), SinkError> {
        self.write_entry(ManifestEntry::Content(record))
    }
}
