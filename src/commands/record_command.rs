use super::{
    exit_result::ExitResult,
    scribe_options::{ScribeOptions, ScribeSubCommand},
    script::{Script, ScriptOutcome},
    ScribeCommand,
};
use crate::{
    error::ScribeError,
    event::Event,
    flags::Flags,
    log::LogLevel::{LogInfo, LogWarn},
    session::Session,
    subsystems::Subsystems,
    trace::{event_queue::EventQueue, trace_writer::TraceWriter},
    unit::{traced_unit::TracedUnit, unit_flags::UnitFlags},
};
use std::{path::PathBuf, sync::Arc};

pub struct RecordCommand {
    script: PathBuf,
    trace: PathBuf,
}

impl RecordCommand {
    pub fn new(options: &ScribeOptions) -> RecordCommand {
        match options.cmd.clone() {
            ScribeSubCommand::Record { script, trace } => RecordCommand { script, trace },
            _ => panic!("Unexpected ScribeSubCommand variant. Not a `Record` variant!"),
        }
    }
}

/// Run `script` through a recording unit. Returns the committed events.
pub(super) fn record_script(
    script: &Script,
    flags: &Flags,
) -> Result<(Vec<Event>, ScriptOutcome), ScribeError> {
    let session = Session::new();
    let stream = Arc::new(EventQueue::with_capacity(flags.max_events));
    let mut unit = TracedUnit::new(
        script.pid,
        UnitFlags::RECORD | flags.initial_enable_flags(),
        &session,
        stream.clone(),
        Subsystems::inert(script.address_space()),
    );

    let outcome = script.run(&mut unit);
    if session.is_killed() {
        return Err(ScribeError::ResourceExhaustion);
    }

    let (events, left) = stream.drain();
    if left > 0 {
        log!(LogWarn, "{} events were never committed", left);
    }
    Ok((events, outcome))
}

impl ScribeCommand for RecordCommand {
    fn run(&mut self) -> ExitResult<()> {
        let script = match Script::load(&self.script) {
            Ok(s) => s,
            Err(e) => return ExitResult::err_from(e, 1),
        };
        let (events, outcome) = match record_script(&script, &Flags::get()) {
            Ok(r) => r,
            Err(e) => return ExitResult::err_from(e, 1),
        };

        let mut writer = match TraceWriter::create(&self.trace) {
            Ok(w) => w,
            Err(e) => return ExitResult::err_from(e, 1),
        };
        for e in &events {
            if let Err(e) = writer.write_event(e) {
                return ExitResult::err_from(e, 1);
            }
        }
        if let Err(e) = writer.close() {
            return ExitResult::err_from(e, 1);
        }
        log!(
            LogInfo,
            "recorded {} calls ({} failed) into {:?}",
            outcome.results.len(),
            outcome.failures.len(),
            self.trace
        );
        ExitResult::Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn event_cap_kills_the_recording() {
        let script =
            Script::parse(r#"{"calls": [{"nr": 20, "ret": 1000}, {"nr": 20, "ret": 1000}]}"#)
                .unwrap();
        let capped = Flags {
            max_events: Some(3),
            ..Flags::default()
        };
        assert_eq!(
            record_script(&script, &capped).map(|_| ()),
            Err(ScribeError::ResourceExhaustion)
        );
        let (events, outcome) = record_script(&script, &Flags::default()).unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(outcome.results, vec![1000, 1000]);
    }
}
