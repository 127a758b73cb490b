use std::path::PathBuf;
use structopt::{clap::AppSettings, StructOpt};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "scribe",
    about = "Deterministic syscall record and replay",
    after_help = "Use SCRIBE_LOG to control logging; e.g. SCRIBE_LOG=all:warn,protocol:debug"
)]
#[structopt(global_settings =
&[AppSettings::AllowNegativeNumbers, AppSettings::UnifiedHelpMessage])]
pub struct ScribeOptions {
    /// Record register snapshots at every syscall entry and compare them during replay.
    #[structopt(long)]
    pub check_regs: bool,

    /// Record only return values, without syscall numbers and arguments.
    #[structopt(long)]
    pub no_syscall_extra: bool,

    /// Don't compare return values during replay.
    #[structopt(long)]
    pub no_ret_check: bool,

    /// Fail a diverging syscall with EDIVERGE instead of recording a mutation.
    #[structopt(long)]
    pub strict_replay: bool,

    /// Stop the recording when the event stream would exceed <max-events> events.
    #[structopt(long)]
    pub max_events: Option<usize>,

    #[structopt(
        short = "E",
        long,
        help = "Any warning or error that is printed is treated as fatal."
    )]
    pub fatal_errors: bool,

    #[structopt(subcommand)]
    pub cmd: ScribeSubCommand,
}

#[derive(StructOpt, Debug, Clone)]
pub enum ScribeSubCommand {
    /// Run a syscall script and record it into a trace file.
    #[structopt(name = "record")]
    Record {
        /// JSON script describing the syscalls of the traced unit
        #[structopt(short = "s", long)]
        script: PathBuf,

        /// Where to write the trace
        #[structopt(short = "o", long = "trace")]
        trace: PathBuf,
    },

    /// Run a syscall script against a recorded trace.
    #[structopt(name = "replay")]
    Replay {
        /// JSON script describing the syscalls of the traced unit
        #[structopt(short = "s", long)]
        script: PathBuf,

        /// The trace to replay
        #[structopt(short = "t", long = "trace")]
        trace: PathBuf,
    },

    /// Dump the events of a trace as JSON, one per line.
    #[structopt(name = "dump")]
    Dump {
        /// Print event counts by type instead of the events
        #[structopt(short = "s", long)]
        statistics: bool,

        trace: PathBuf,
    },
}
