//! Syscall scripts: a JSON description of what a traced unit does, used to
//! drive recording and replay without a real tracee.

use crate::{
    error::ScribeError,
    log::LogLevel::LogDebug,
    registers::Registers,
    subsystems::SimulatedMemory,
    syscall::identity::is_scribe_syscall,
    unit::traced_unit::TracedUnit,
};
use serde::Deserialize;
use std::{fs, io, path::Path};

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    #[serde(default = "default_pid")]
    pub pid: libc::pid_t,
    /// Contents of the unit's address space.
    #[serde(default)]
    pub memory: Vec<MemoryRegion>,
    pub calls: Vec<ScriptedCall>,
}

fn default_pid() -> libc::pid_t {
    1000
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryRegion {
    pub addr: u64,
    #[serde(default)]
    pub words: Vec<u32>,
    #[serde(default)]
    pub bytes: Vec<u8>,
}

/// One raw syscall. `ret` is what the kernel returns; control syscalls
/// compute their own result and ignore it.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScriptedCall {
    pub nr: i32,
    #[serde(default)]
    pub args: Vec<u64>,
    #[serde(default)]
    pub ret: i64,
}

/// What happened to each call of a script.
#[derive(Debug, Default)]
pub struct ScriptOutcome {
    /// Result each call returned to the unit.
    pub results: Vec<i64>,
    /// Calls that were failed by the engine, with their index.
    pub failures: Vec<(usize, ScribeError)>,
}

impl Script {
    pub fn load(path: &Path) -> io::Result<Script> {
        let text = fs::read_to_string(path)?;
        Script::parse(&text)
    }

    pub fn parse(text: &str) -> io::Result<Script> {
        let script: Script = serde_json::from_str(text)?;
        if let Some(c) = script.calls.iter().find(|c| c.args.len() > 6) {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!("syscall {} has more than 6 arguments", c.nr),
            ));
        }
        Ok(script)
    }

    pub fn address_space(&self) -> SimulatedMemory {
        let mut m = SimulatedMemory::new();
        for region in &self.memory {
            m.map_words(region.addr, &region.words);
            m.map(region.addr + 4 * region.words.len() as u64, &region.bytes);
        }
        m
    }

    /// Run every call through `unit`'s syscall boundary.
    pub fn run(&self, unit: &mut TracedUnit) -> ScriptOutcome {
        let mut outcome = ScriptOutcome::default();
        for (i, call) in self.calls.iter().enumerate() {
            let mut regs = Registers::for_syscall(call.nr, &call.args);
            let ret = match unit.enter_syscall(&regs) {
                Ok(()) if is_scribe_syscall(call.nr) => {
                    unit.handle_control_syscall(&regs).unwrap_or(call.ret)
                }
                Ok(()) => call.ret,
                Err(e) => {
                    let ret = -(e.errno() as i64);
                    outcome.failures.push((i, e));
                    ret
                }
            };
            regs.set_syscall_result(ret);
            unit.exit_syscall(&regs);
            log!(LogDebug, "call {}: nr {} returned {}", i, call.nr, ret);
            outcome.results.push(ret);
            if unit.session().is_killed() {
                break;
            }
        }
        outcome
    }
}
