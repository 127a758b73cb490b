//! Byte encoding of events, shared by the control surface and trace files.
//!
//! Every event starts with a one byte type tag. Sized events follow it with
//! a little-endian u16 giving the length of their variable part. All
//! integers are little-endian.

use crate::{
    error::RequestError,
    event::{Event, EventType, EvSyscallExtra},
    registers::{Registers, REGISTERS_SIZE},
    unit::unit_flags::Duration,
};
use std::convert::{TryFrom, TryInto};

const ARG_SIZE: usize = 8;
const MAX_ARGS: usize = 6;

const SYSCALL_PAYLOAD: usize = 8;
const EXTRA_FIXED_PAYLOAD: usize = 8 + 4;
const DIVERGE_SYSCALL_PAYLOAD: usize = 4 + 1 + MAX_ARGS * ARG_SIZE;
const SET_FLAGS_PAYLOAD: usize = 4 + 1;

/// Largest encoded event.
pub const MAX_EVENT_LEN: usize = 3 + EXTRA_FIXED_PAYLOAD + MAX_ARGS * ARG_SIZE;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WireError {
    /// Fewer bytes than the header announces.
    Truncated,
    UnknownType(u8),
    Malformed(&'static str),
}

impl From<WireError> for RequestError {
    fn from(e: WireError) -> Self {
        match e {
            WireError::Truncated => RequestError::BadBuffer,
            WireError::UnknownType(t) => RequestError::UnknownEventType(t),
            WireError::Malformed(what) => RequestError::MalformedEvent(what),
        }
    }
}

pub fn header_len(ty: EventType) -> usize {
    if ty.is_sized() {
        3
    } else {
        1
    }
}

fn fixed_payload_len(ty: EventType) -> usize {
    match ty {
        EventType::EvSyscall | EventType::EvDivergeSyscallReturn => SYSCALL_PAYLOAD,
        EventType::EvSyscallExtra => EXTRA_FIXED_PAYLOAD,
        EventType::EvRegs | EventType::EvDivergeRegs => REGISTERS_SIZE,
        EventType::EvDivergeSyscall => DIVERGE_SYSCALL_PAYLOAD,
        EventType::EvSetFlags => SET_FLAGS_PAYLOAD,
        EventType::EvSyscallEnd | EventType::EvNop => 0,
    }
}

fn event_type_of(tag: u8) -> Result<EventType, WireError> {
    EventType::try_from(tag).map_err(WireError::UnknownType)
}

/// Total encoded length of the event whose header starts `data`. Needs the
/// full header: one byte, or three for sized events.
pub fn event_len_from_header(data: &[u8]) -> Result<usize, WireError> {
    let tag = *data.first().ok_or(WireError::Truncated)?;
    let ty = event_type_of(tag)?;
    let hlen = header_len(ty);
    if data.len() < hlen {
        return Err(WireError::Truncated);
    }
    let mut len = hlen + fixed_payload_len(ty);
    if ty.is_sized() {
        let size = u16::from_le_bytes([data[1], data[2]]) as usize;
        check_args_size(size)?;
        len += size;
    }
    Ok(len)
}

fn check_args_size(size: usize) -> Result<(), WireError> {
    if size % ARG_SIZE != 0 {
        return Err(WireError::Malformed("argument block is not a whole number of words"));
    }
    if size / ARG_SIZE > MAX_ARGS {
        return Err(WireError::Malformed("too many arguments"));
    }
    Ok(())
}

pub fn encoded_len(event: &Event) -> usize {
    let ty = event.event_type();
    let mut len = header_len(ty) + fixed_payload_len(ty);
    if let Event::SyscallExtra { args, .. } = event {
        len += args.len() * ARG_SIZE;
    }
    len
}

pub fn encode(event: &Event) -> Vec<u8> {
    let mut out = Vec::with_capacity(encoded_len(event));
    encode_into(event, &mut out);
    out
}

pub fn encode_into(event: &Event, out: &mut Vec<u8>) {
    out.push(event.event_type() as u8);
    match event {
        Event::Syscall { ret } | Event::DivergeSyscallReturn { ret } => {
            out.extend_from_slice(&ret.to_le_bytes())
        }
        Event::SyscallExtra { nr, args, ret } => {
            let size = (args.len().min(MAX_ARGS) * ARG_SIZE) as u16;
            out.extend_from_slice(&size.to_le_bytes());
            out.extend_from_slice(&ret.to_le_bytes());
            out.extend_from_slice(&nr.to_le_bytes());
            for a in args.iter().take(MAX_ARGS) {
                out.extend_from_slice(&a.to_le_bytes());
            }
        }
        Event::Regs { regs } | Event::DivergeRegs { regs } => {
            out.extend_from_slice(&regs.to_bytes())
        }
        Event::DivergeSyscall { nr, num_args, args } => {
            out.extend_from_slice(&nr.to_le_bytes());
            out.push(*num_args);
            for a in args.iter() {
                out.extend_from_slice(&a.to_le_bytes());
            }
        }
        Event::SetFlags { flags, duration } => {
            out.extend_from_slice(&flags.to_le_bytes());
            out.push(*duration as u8);
        }
        Event::SyscallEnd | Event::Nop => (),
    }
}

struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], WireError> {
        let end = self.pos.checked_add(n).ok_or(WireError::Truncated)?;
        let s = self.data.get(self.pos..end).ok_or(WireError::Truncated)?;
        self.pos = end;
        Ok(s)
    }

    fn u8(&mut self) -> Result<u8, WireError> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16, WireError> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        self.take(N)?.try_into().map_err(|_| WireError::Truncated)
    }
}

/// Decode the event at the start of `data`. Returns it with the number of
/// bytes it occupied.
pub fn decode(data: &[u8]) -> Result<(Event, usize), WireError> {
    let mut c = Cursor { data, pos: 0 };
    let ty = event_type_of(c.u8()?)?;
    let event = match ty {
        EventType::EvSyscall => Event::Syscall { ret: c.i64()? },
        EventType::EvDivergeSyscallReturn => Event::DivergeSyscallReturn { ret: c.i64()? },
        EvSyscallExtra => {
            let size = c.u16()? as usize;
            check_args_size(size)?;
            let ret = c.i64()?;
            let nr = c.i32()?;
            let mut args = Vec::with_capacity(size / ARG_SIZE);
            for _ in 0..size / ARG_SIZE {
                args.push(c.u64()?);
            }
            Event::SyscallExtra { nr, args, ret }
        }
        EventType::EvRegs | EventType::EvDivergeRegs => {
            let regs = Registers::from_bytes(c.take(REGISTERS_SIZE)?).ok_or(WireError::Truncated)?;
            if ty == EventType::EvRegs {
                Event::Regs { regs }
            } else {
                Event::DivergeRegs { regs }
            }
        }
        EventType::EvDivergeSyscall => {
            let nr = c.i32()?;
            let num_args = c.u8()?;
            let mut args = [0u64; MAX_ARGS];
            for a in args.iter_mut() {
                *a = c.u64()?;
            }
            Event::DivergeSyscall { nr, num_args, args }
        }
        EventType::EvSetFlags => {
            let flags = c.u32()?;
            let duration = Duration::try_from(c.u8()?)
                .map_err(|_| WireError::Malformed("unknown flag duration"))?;
            Event::SetFlags { flags, duration }
        }
        EventType::EvSyscallEnd => Event::SyscallEnd,
        EventType::EvNop => Event::Nop,
    };
    Ok((event, c.pos))
}

/// Decode a buffer that must hold exactly one event.
pub fn decode_exact(data: &[u8]) -> Result<Event, WireError> {
    let (event, used) = decode(data)?;
    if used != data.len() {
        return Err(WireError::Malformed("trailing bytes after event"));
    }
    Ok(event)
}
