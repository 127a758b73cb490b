use super::{
    exit_result::ExitResult,
    scribe_options::{ScribeOptions, ScribeSubCommand},
    ScribeCommand,
};
use crate::{
    event::Event,
    trace::{trace_reader::TraceReader, TRACE_VERSION},
};
use serde::Serialize;
use std::{
    collections::BTreeMap,
    io::{self, Write},
    path::PathBuf,
};

pub struct DumpCommand {
    statistics: bool,
    trace: PathBuf,
}

impl DumpCommand {
    pub fn new(options: &ScribeOptions) -> DumpCommand {
        match options.cmd.clone() {
            ScribeSubCommand::Dump { statistics, trace } => DumpCommand { statistics, trace },
            _ => panic!("Unexpected ScribeSubCommand variant. Not a `Dump` variant!"),
        }
    }

    fn dump_header(&self, trace: &TraceReader, out: &mut dyn Write) -> io::Result<()> {
        let header = TraceHeader {
            version: TRACE_VERSION,
            uuid: uuid_string(trace.uuid()),
        };
        serde_json::to_writer(&mut *out, &header)?;
        writeln!(out)
    }

    fn dump_events(&self, events: &[Event], out: &mut dyn Write) -> io::Result<()> {
        for e in events {
            serde_json::to_writer(&mut *out, e)?;
            writeln!(out)?;
        }
        Ok(())
    }

    fn dump_statistics(&self, trace: &TraceReader, out: &mut dyn Write) -> io::Result<()> {
        let stats = TraceStatistics::new(trace);
        serde_json::to_writer(&mut *out, &stats)?;
        writeln!(out)
    }
}

fn uuid_string(uuid: &[u8; 16]) -> String {
    uuid.iter().map(|b| format!("{:02x}", b)).collect()
}

#[derive(Serialize)]
struct TraceHeader {
    version: u32,
    uuid: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct TraceStatistics {
    uuid: String,
    events: usize,
    by_type: BTreeMap<String, usize>,
}

impl TraceStatistics {
    fn new(trace: &TraceReader) -> TraceStatistics {
        let mut by_type = BTreeMap::new();
        for e in trace.events() {
            *by_type.entry(e.event_type().to_string()).or_insert(0) += 1;
        }
        TraceStatistics {
            uuid: uuid_string(trace.uuid()),
            events: trace.events().len(),
            by_type,
        }
    }
}

impl ScribeCommand for DumpCommand {
    fn run(&mut self) -> ExitResult<()> {
        let trace = match TraceReader::open(&self.trace) {
            Ok(t) => t,
            Err(e) => return ExitResult::err_from(e, 1),
        };
        let stdout = io::stdout();
        let mut out = stdout.lock();
        let result = if self.statistics {
            self.dump_statistics(&trace, &mut out)
        } else {
            self.dump_header(&trace, &mut out)
                .and_then(|_| self.dump_events(trace.events(), &mut out))
        };
        match result {
            Ok(()) => ExitResult::Ok(()),
            Err(e) => ExitResult::err_from(e, 1),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn events_are_json_lines() {
        let cmd = DumpCommand {
            statistics: false,
            trace: PathBuf::new(),
        };
        let mut out = Vec::new();
        cmd.dump_events(&[Event::Syscall { ret: 2 }, Event::SyscallEnd], &mut out)
            .unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "{\"type\":\"syscall\",\"ret\":2}\n{\"type\":\"syscall_end\"}\n"
        );
    }
}
