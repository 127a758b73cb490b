use crate::{registers::Registers, unit::unit_flags::Duration};
use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    fmt::{self, Display, Formatter},
};

/// Wire tag of an event. Values are stable: they are written to traces.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum EventType {
    EvSyscall = 1,
    EvSyscallExtra = 2,
    EvSyscallEnd = 3,
    EvRegs = 4,
    EvDivergeRegs = 5,
    EvDivergeSyscall = 6,
    EvDivergeSyscallReturn = 7,
    EvSetFlags = 8,
    EvNop = 9,
}

pub use EventType::*;

impl EventType {
    /// Sized events carry a u16 payload size after the type tag because
    /// their payload length is not implied by the type alone.
    pub fn is_sized(self) -> bool {
        self == EvSyscallExtra
    }
}

impl TryFrom<u8> for EventType {
    type Error = u8;

    fn try_from(tag: u8) -> Result<Self, Self::Error> {
        let ty = match tag {
            1 => EvSyscall,
            2 => EvSyscallExtra,
            3 => EvSyscallEnd,
            4 => EvRegs,
            5 => EvDivergeRegs,
            6 => EvDivergeSyscall,
            7 => EvDivergeSyscallReturn,
            8 => EvSetFlags,
            9 => EvNop,
            _ => return Err(tag),
        };
        Ok(ty)
    }
}

impl Display for EventType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            EvSyscall => "syscall",
            EvSyscallExtra => "syscall_extra",
            EvSyscallEnd => "syscall_end",
            EvRegs => "regs",
            EvDivergeRegs => "diverge_regs",
            EvDivergeSyscall => "diverge_syscall",
            EvDivergeSyscallReturn => "diverge_syscall_return",
            EvSetFlags => "set_flags",
            EvNop => "nop",
        };
        write!(f, "{}", name)
    }
}

/// A record in an event stream.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Return value of a syscall, plain variant.
    Syscall { ret: i64 },
    /// Syscall identity, arguments and return value. Always followed, at
    /// some later position, by a `SyscallEnd`.
    SyscallExtra { nr: i32, args: Vec<u64>, ret: i64 },
    SyscallEnd,
    Regs { regs: Registers },
    DivergeRegs { regs: Registers },
    DivergeSyscall {
        nr: i32,
        num_args: u8,
        args: [u64; 6],
    },
    DivergeSyscallReturn { ret: i64 },
    /// Injected into a replay stream to change the unit's flags.
    SetFlags { flags: u32, duration: Duration },
    Nop,
}

impl Event {
    pub fn event_type(&self) -> EventType {
        match self {
            Event::Syscall { .. } => EvSyscall,
            Event::SyscallExtra { .. } => EvSyscallExtra,
            Event::SyscallEnd => EvSyscallEnd,
            Event::Regs { .. } => EvRegs,
            Event::DivergeRegs { .. } => EvDivergeRegs,
            Event::DivergeSyscall { .. } => EvDivergeSyscall,
            Event::DivergeSyscallReturn { .. } => EvDivergeSyscallReturn,
            Event::SetFlags { .. } => EvSetFlags,
            Event::Nop => EvNop,
        }
    }

    /// Divergence notes are diagnostics; they never appear in a recording.
    pub fn is_divergence_note(&self) -> bool {
        match self.event_type() {
            EvDivergeRegs | EvDivergeSyscall | EvDivergeSyscallReturn => true,
            _ => false,
        }
    }
}

impl Display for Event {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Event::Syscall { ret } | Event::DivergeSyscallReturn { ret } => {
                write!(f, "{} ret={}", self.event_type(), ret)
            }
            Event::SyscallExtra { nr, args, ret } => write!(
                f,
                "{} {}({:x?}) = {}",
                self.event_type(),
                crate::kernel_metadata::syscall_name(*nr),
                args,
                ret
            ),
            Event::DivergeSyscall { nr, num_args, args } => write!(
                f,
                "{} {}({:x?})",
                self.event_type(),
                crate::kernel_metadata::syscall_name(*nr),
                &args[..(*num_args as usize).min(6)]
            ),
            Event::Regs { regs } | Event::DivergeRegs { regs } => {
                write!(f, "{} eip={:#x} esp={:#x}", self.event_type(), regs.eip, regs.esp)
            }
            Event::SetFlags { flags, duration } => {
                write!(f, "{} {:#x} {:?}", self.event_type(), flags, duration)
            }
            Event::SyscallEnd | Event::Nop => write!(f, "{}", self.event_type()),
        }
    }
}
