use super::{wire, TRACE_MAGIC, TRACE_VERSION};
use crate::{event::Event, log::LogLevel::LogInfo};
use crc32fast::Hasher;
use rand::random;
use std::{
    fs::File,
    io::{self, BufWriter, Write},
    path::{Path, PathBuf},
};

/// Writes a recorded event stream to a trace file.
///
/// Layout: magic, version (u32), a random 16 byte trace id, the encoded
/// events back to back, then a CRC-32 of everything before it.
pub struct TraceWriter {
    path: PathBuf,
    file: BufWriter<File>,
    hasher: Hasher,
    uuid: [u8; 16],
    event_count: u64,
}

impl TraceWriter {
    pub fn create(path: &Path) -> io::Result<TraceWriter> {
        let file = BufWriter::new(File::create(path)?);
        let mut w = TraceWriter {
            path: path.to_owned(),
            file,
            hasher: Hasher::new(),
            uuid: random(),
            event_count: 0,
        };
        w.write_bytes(TRACE_MAGIC)?;
        w.write_bytes(&TRACE_VERSION.to_le_bytes())?;
        let uuid = w.uuid;
        w.write_bytes(&uuid)?;
        Ok(w)
    }

    fn write_bytes(&mut self, data: &[u8]) -> io::Result<()> {
        self.hasher.update(data);
        self.file.write_all(data)
    }

    pub fn write_event(&mut self, event: &Event) -> io::Result<()> {
        let bytes = wire::encode(event);
        self.write_bytes(&bytes)?;
        self.event_count += 1;
        Ok(())
    }

    pub fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    pub fn event_count(&self) -> u64 {
        self.event_count
    }

    /// Append the checksum and flush. A trace without its trailer is
    /// rejected by the reader.
    pub fn close(mut self) -> io::Result<()> {
        let crc = self.hasher.clone().finalize();
        self.file.write_all(&crc.to_le_bytes())?;
        self.file.flush()?;
        log!(
            LogInfo,
            "wrote {} events to {:?}",
            self.event_count,
            self.path
        );
        Ok(())
    }
}
