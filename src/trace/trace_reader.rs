use super::{event_queue::EventQueue, wire, TRACE_MAGIC, TRACE_VERSION};
use crate::event::Event;
use std::{
    convert::TryInto,
    fs,
    io::{self, ErrorKind},
    path::Path,
};

const HEADER_LEN: usize = 8 + 4 + 16;
const TRAILER_LEN: usize = 4;

fn invalid(msg: String) -> io::Error {
    io::Error::new(ErrorKind::InvalidData, msg)
}

/// A trace file, fully read and validated.
pub struct TraceReader {
    uuid: [u8; 16],
    events: Vec<Event>,
}

impl TraceReader {
    pub fn open(path: &Path) -> io::Result<TraceReader> {
        let data = fs::read(path)?;
        TraceReader::from_bytes(&data)
            .map_err(|e| invalid(format!("{:?}: {}", path, e.to_string())))
    }

    pub fn from_bytes(data: &[u8]) -> io::Result<TraceReader> {
        if data.len() < HEADER_LEN + TRAILER_LEN {
            return Err(invalid("trace is truncated".into()));
        }
        if &data[..8] != TRACE_MAGIC {
            return Err(invalid("not a scribe trace".into()));
        }
        let version = u32::from_le_bytes(data[8..12].try_into().map_err(|_| invalid("bad header".into()))?);
        if version != TRACE_VERSION {
            return Err(invalid(format!(
                "trace version {} is not supported (expected {})",
                version, TRACE_VERSION
            )));
        }

        let body_end = data.len() - TRAILER_LEN;
        let stored_crc = u32::from_le_bytes(
            data[body_end..]
                .try_into()
                .map_err(|_| invalid("bad trailer".into()))?,
        );
        let crc = crc32fast::hash(&data[..body_end]);
        if crc != stored_crc {
            return Err(invalid(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored_crc, crc
            )));
        }

        let mut uuid = [0u8; 16];
        uuid.copy_from_slice(&data[12..HEADER_LEN]);

        let mut events = Vec::new();
        let mut pos = HEADER_LEN;
        while pos < body_end {
            let (event, used) = wire::decode(&data[pos..body_end])
                .map_err(|e| invalid(format!("bad event at offset {}: {:?}", pos, e)))?;
            events.push(event);
            pos += used;
        }
        Ok(TraceReader { uuid, events })
    }

    pub fn uuid(&self) -> &[u8; 16] {
        &self.uuid
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// A sealed stream for a replaying unit.
    pub fn into_queue(self) -> EventQueue {
        EventQueue::from_events(self.events)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{kernel_abi::x86, trace::trace_writer::TraceWriter};
    use std::env;

    fn temp_trace(name: &str) -> std::path::PathBuf {
        env::temp_dir().join(format!("scribe-{}-{}.trace", name, std::process::id()))
    }

    fn sample() -> Vec<Event> {
        vec![
            Event::SyscallExtra {
                nr: x86::OPEN,
                args: vec![0x0804_a000, 0],
                ret: 3,
            },
            Event::SyscallEnd,
            Event::Syscall { ret: 0 },
        ]
    }

    #[test]
    fn write_then_read() {
        let path = temp_trace("rw");
        let mut w = TraceWriter::create(&path).unwrap();
        let uuid = *w.uuid();
        for e in sample() {
            w.write_event(&e).unwrap();
        }
        w.close().unwrap();

        let r = TraceReader::open(&path).unwrap();
        assert_eq!(r.uuid(), &uuid);
        assert_eq!(r.events(), &sample()[..]);
        fs::remove_file(&path).unwrap();
    }

    #[test]
    fn corruption_is_detected() {
        let path = temp_trace("corrupt");
        let mut w = TraceWriter::create(&path).unwrap();
        for e in sample() {
            w.write_event(&e).unwrap();
        }
        w.close().unwrap();

        let mut data = fs::read(&path).unwrap();
        data[HEADER_LEN + 4] ^= 0xff;
        let err = TraceReader::from_bytes(&data).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
        assert!(err.to_string().contains("checksum"));

        data.truncate(10);
        assert!(TraceReader::from_bytes(&data).is_err());
        fs::remove_file(&path).unwrap();
    }
}
