// The engine exposes operations for embedders that the command line
// driver itself never calls.
#![allow(dead_code)]

#[macro_use]
extern crate bitflags;
#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate static_assertions;

#[macro_use]
mod log;
mod commands;
mod error;
mod event;
mod flags;
mod kernel_abi;
mod kernel_metadata;
mod registers;
mod session;
mod subsystems;
mod syscall;
#[cfg(test)]
mod test_support;
mod trace;
mod unit;

use crate::{
    commands::{
        dump_command::DumpCommand,
        exit_result::ExitResult,
        record_command::RecordCommand,
        replay_command::ReplayCommand,
        scribe_options::{ScribeOptions, ScribeSubCommand},
        ScribeCommand,
    },
    flags::Flags,
    log::LogLevel::LogWarn,
};
use structopt::StructOpt;

fn init_flags(options: &ScribeOptions) {
    Flags::init(Flags {
        check_regs: options.check_regs,
        no_syscall_extra: options.no_syscall_extra,
        no_ret_check: options.no_ret_check,
        strict_replay: options.strict_replay,
        max_events: options.max_events,
        fatal_errors_and_warnings: options.fatal_errors,
    });
    if options.fatal_errors && !is_logging!(LogWarn) {
        log::set_all_logging(LogWarn);
    }
}

fn main() -> ExitResult<()> {
    let options = ScribeOptions::from_args();
    init_flags(&options);

    match &options.cmd {
        ScribeSubCommand::Record { .. } => RecordCommand::new(&options).run(),
        ScribeSubCommand::Replay { .. } => ReplayCommand::new(&options).run(),
        ScribeSubCommand::Dump { .. } => DumpCommand::new(&options).run(),
    }
}
