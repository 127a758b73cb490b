//! Operations a traced program uses to steer its own scribing.

use crate::{
    error::{RequestError, Result, ScribeError},
    kernel_abi::{
        NR_GET_SCRIBE_FLAGS,
        NR_SCRIBE_FILTER_SYSCALL,
        NR_SCRIBE_RECV_EVENT,
        NR_SCRIBE_SEND_EVENT,
        NR_SET_SCRIBE_FLAGS,
    },
    log::LogLevel::LogDebug,
    registers::Registers,
    trace::{
        event_stream::WaitMode,
        wire::{self, MAX_EVENT_LEN},
    },
    unit::{
        traced_unit::TracedUnit,
        unit_flags::{Duration, UnitFlags},
    },
};
use libc::pid_t;
use std::convert::TryFrom;

impl TracedUnit {
    fn is_self(&self, pid: pid_t) -> bool {
        pid == 0 || pid == self.pid
    }

    /// Flags of `pid`, or of this unit when `pid` is 0.
    pub fn get_scribe_flags(&self, pid: pid_t) -> Result<UnitFlags> {
        if self.is_self(pid) {
            if !self.is_scribed() {
                return Err(RequestError::NotScribed.into());
            }
            return Ok(self.flags());
        }

        let flags = self
            .session
            .unit_flags(pid)
            .ok_or(RequestError::NoSuchUnit(pid))?;
        if !flags.is_scribed() {
            return Err(RequestError::NotScribed.into());
        }
        Ok(flags)
    }

    /// Only a unit's own flags can be changed.
    pub fn set_scribe_flags(
        &mut self,
        pid: pid_t,
        flags: UnitFlags,
        duration: Duration,
    ) -> Result<()> {
        if !self.is_self(pid) {
            return Err(RequestError::RemoteSetUnsupported.into());
        }
        if !self.is_scribed() {
            return Err(RequestError::NotScribed.into());
        }
        self.set_flags(flags, duration);
        Ok(())
    }

    /// Append a user-built event to the unit's recording.
    pub fn send_event(&mut self, data: &[u8]) -> Result<()> {
        if !self.is_recording() {
            return Err(RequestError::NotRecording.into());
        }
        let event = wire::decode_exact(data).map_err(RequestError::from)?;
        log!(LogDebug, "unit {} sends {}", self.pid, event);
        self.output_stream().enqueue(event)?;
        Ok(())
    }

    /// Take the next event off the unit's replay stream and encode it into
    /// `out`. Returns the encoded length. The event is consumed even when
    /// `out` is too small for it.
    pub fn recv_event(&mut self, out: &mut [u8]) -> Result<usize> {
        if !self.is_replaying() {
            return Err(RequestError::NotReplaying.into());
        }
        let event = self.stream.dequeue(WaitMode::WaitInterruptible)?;
        let bytes = wire::encode(&event);
        if bytes.len() > out.len() {
            return Err(RequestError::BufferTooSmall {
                needed: bytes.len(),
                available: out.len(),
            }
            .into());
        }
        out[..bytes.len()].copy_from_slice(&bytes);
        Ok(bytes.len())
    }

    /// Turn scribing of one syscall identity on or off for this unit.
    pub fn filter_syscall(&mut self, nr: i32, enable: bool) -> Result<()> {
        if !self.is_scribed() {
            return Err(RequestError::FilterUnscribed.into());
        }
        if !self.enabled_syscalls.set(nr, enable) {
            return Err(RequestError::UnknownSyscall(nr).into());
        }
        log!(
            LogDebug,
            "unit {} {} {}",
            self.pid,
            if enable { "scribes" } else { "ignores" },
            crate::kernel_metadata::syscall_name(nr)
        );
        Ok(())
    }

    /// Run a control syscall from its registers, with pointers into the
    /// unit's memory. Returns the syscall result, or None when `regs` isn't
    /// a control syscall.
    pub fn handle_control_syscall(&mut self, regs: &Registers) -> Option<i64> {
        let arg = |i: usize| regs.arg(i) as u32;
        let result = match regs.original_syscallno() {
            NR_GET_SCRIBE_FLAGS => self.sys_get_scribe_flags(arg(0) as pid_t, arg(1) as u64),
            NR_SET_SCRIBE_FLAGS => {
                let duration = u8::try_from(arg(2))
                    .ok()
                    .and_then(|d| Duration::try_from(d).ok());
                match duration {
                    Some(d) => self
                        .set_scribe_flags(arg(0) as pid_t, UnitFlags::from_bits_truncate(arg(1)), d)
                        .map(|_| 0),
                    None => Err(RequestError::MalformedEvent("unknown flag duration").into()),
                }
            }
            NR_SCRIBE_SEND_EVENT => self.sys_send_event(arg(0) as u64),
            NR_SCRIBE_RECV_EVENT => self.sys_recv_event(arg(0) as u64, arg(1) as usize),
            NR_SCRIBE_FILTER_SYSCALL => self.filter_syscall(arg(0) as i32, arg(1) != 0).map(|_| 0),
            _ => return None,
        };
        Some(match result {
            Ok(v) => v,
            Err(e) => {
                log!(LogDebug, "control syscall failed: {}", e);
                -(e.errno() as i64)
            }
        })
    }

    fn sys_get_scribe_flags(&mut self, pid: pid_t, out_addr: u64) -> Result<i64> {
        let flags = self.get_scribe_flags(pid)?;
        if out_addr != 0 {
            self.memory
                .write_user(out_addr, &flags.bits().to_le_bytes())
                .map_err(|_| RequestError::BadBuffer)?;
        }
        Ok(0)
    }

    fn sys_send_event(&mut self, addr: u64) -> Result<i64> {
        if !self.is_recording() {
            return Err(RequestError::NotRecording.into());
        }
        let mut header = [0u8; 3];
        self.memory
            .read_user(addr, &mut header[..1])
            .map_err(|_| RequestError::BadBuffer)?;
        let ty = crate::event::EventType::try_from(header[0])
            .map_err(RequestError::UnknownEventType)?;
        let hlen = wire::header_len(ty);
        self.memory
            .read_user(addr, &mut header[..hlen])
            .map_err(|_| RequestError::BadBuffer)?;
        let len = wire::event_len_from_header(&header[..hlen]).map_err(RequestError::from)?;

        let mut data = vec![0u8; len];
        self.memory
            .read_user(addr, &mut data)
            .map_err(|_| RequestError::BadBuffer)?;
        self.send_event(&data)?;
        Ok(0)
    }

    fn sys_recv_event(&mut self, addr: u64, size: usize) -> Result<i64> {
        let mut buf = vec![0u8; size.min(MAX_EVENT_LEN)];
        let n = self.recv_event(&mut buf)?;
        self.memory
            .write_user(addr, &buf[..n])
            .map_err(|_| ScribeError::from(RequestError::BadBuffer))?;
        Ok(n as i64)
    }
}
