use exit_result::ExitResult;

pub mod dump_command;
pub mod exit_result;
pub mod record_command;
pub mod replay_command;
pub mod scribe_options;
pub mod script;

pub trait ScribeCommand {
    fn run(&mut self) -> ExitResult<()>;
}
