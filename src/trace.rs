pub mod event_queue;
pub mod event_stream;
pub mod trace_reader;
pub mod trace_writer;
pub mod wire;

const TRACE_MAGIC: &[u8; 8] = b"SCRIBE\0\x01";

/// Bump when the event encoding changes.
pub const TRACE_VERSION: u32 = 1;
