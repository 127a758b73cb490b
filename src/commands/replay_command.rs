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
    trace::{event_queue::EventQueue, trace_reader::TraceReader},
    unit::{traced_unit::TracedUnit, unit_flags::UnitFlags},
};
use serde::Serialize;
use std::{io, path::PathBuf, sync::Arc};

pub struct ReplayCommand {
    script: PathBuf,
    trace: PathBuf,
}

impl ReplayCommand {
    pub fn new(options: &ScribeOptions) -> ReplayCommand {
        match options.cmd.clone() {
            ScribeSubCommand::Replay { script, trace } => ReplayCommand { script, trace },
            _ => panic!("Unexpected ScribeSubCommand variant. Not a `Replay` variant!"),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ReplaySummary {
    calls: usize,
    results: Vec<i64>,
    failed_calls: Vec<usize>,
    divergences: usize,
    unconsumed_events: usize,
}

/// Everything a replay produced.
struct ReplayRun {
    notes: Vec<Event>,
    summary: ReplaySummary,
    outcome: ScriptOutcome,
    killed: bool,
}

/// Replay `stream` against `script` in a fresh session.
fn replay_script(script: &Script, stream: Arc<EventQueue>, flags: &Flags) -> ReplayRun {
    let mut unit_flags = UnitFlags::REPLAY | flags.initial_enable_flags();
    if flags.strict_replay {
        unit_flags |= UnitFlags::STRICT_REPLAY;
    }

    let session = Session::new();
    let mut unit = TracedUnit::new(
        script.pid,
        unit_flags,
        &session,
        stream.clone(),
        Subsystems::inert(script.address_space()),
    );
    let outcome = script.run(&mut unit);

    let (notes, _) = session.divergences().drain();
    let unconsumed = stream.len();
    if unconsumed > 0 {
        log!(LogWarn, "{} recorded events were not replayed", unconsumed);
    }
    let summary = ReplaySummary {
        calls: outcome.results.len(),
        results: outcome.results.clone(),
        failed_calls: outcome.failures.iter().map(|(i, _)| *i).collect(),
        divergences: notes.iter().filter(|e| e.is_divergence_note()).count(),
        unconsumed_events: unconsumed,
    };
    ReplayRun {
        notes,
        summary,
        outcome,
        killed: session.is_killed(),
    }
}

impl ReplayRun {
    /// How the command ends. A call the engine failed because of a
    /// divergence is fatal whatever mode the unit replayed in: forks are
    /// always replayed strictly.
    fn exit_result(&self, flags: &Flags) -> ExitResult<()> {
        if self.killed {
            return ExitResult::err_from(ScribeError::ResourceExhaustion, 1);
        }
        if let Some((i, e)) = self.outcome.failures.iter().find(|(_, e)| e.is_divergence()) {
            return ExitResult::err_from(
                io::Error::new(io::ErrorKind::Other, format!("call {}: {}", i, e)),
                2,
            );
        }
        if flags.fatal_errors_and_warnings
            && (self.summary.divergences > 0 || self.summary.unconsumed_events > 0)
        {
            return ExitResult::err_from(
                io::Error::new(io::ErrorKind::Other, "replay diverged from the trace"),
                2,
            );
        }
        ExitResult::Ok(())
    }
}

impl ScribeCommand for ReplayCommand {
    fn run(&mut self) -> ExitResult<()> {
        let script = match Script::load(&self.script) {
            Ok(s) => s,
            Err(e) => return ExitResult::err_from(e, 1),
        };
        let reader = match TraceReader::open(&self.trace) {
            Ok(r) => r,
            Err(e) => return ExitResult::err_from(e, 1),
        };
        let flags = Flags::get();

        let run = replay_script(&script, Arc::new(reader.into_queue()), &flags);
        for note in &run.notes {
            match serde_json::to_string(note) {
                Ok(s) => println!("{}", s),
                Err(e) => return ExitResult::err_from(e, 1),
            }
        }
        match serde_json::to_string(&run.summary) {
            Ok(s) => eprintln!("{}", s),
            Err(e) => return ExitResult::err_from(e, 1),
        }
        log!(LogInfo, "replayed {} calls", run.summary.calls);

        run.exit_result(&flags)
    }
}
