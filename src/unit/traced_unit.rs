use super::{
    syscall_bitmap::SyscallBitmap,
    unit_flags::{SharedFlags, UnitFlags},
    UnitSharedPtr,
};
use crate::{
    error::ScribeError,
    event::Event,
    kernel_metadata::syscall_name,
    log::LogLevel::{LogDebug, LogInfo, LogWarn},
    session::SessionSharedPtr,
    subsystems::{Bookmarks, MemoryScribe, SignalSync, Subsystems},
    trace::event_stream::{EventStream, SlotHandle},
};
use libc::pid_t;
use std::sync::{Arc, Mutex};

/// Syscall the unit is currently in, after multiplexer expansion.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct CurrentSyscall {
    pub nr: i32,
    pub num_args: usize,
    pub args: [u64; 6],
}

impl CurrentSyscall {
    pub fn args(&self) -> &[u64] {
        &self.args[..self.num_args.min(6)]
    }
}

/// A reservation for the return value of the current syscall, and the
/// stream it was made on.
pub(crate) struct PendingSlot {
    pub(crate) stream: Arc<dyn EventStream>,
    pub(crate) handle: SlotHandle,
}

/// Per-unit scribe state: one thread of a traced program.
pub struct TracedUnit {
    pub(crate) pid: pid_t,
    /// Published to the session so other units can query them.
    pub(crate) flags: SharedFlags,
    /// Flags to restore when the current syscall exits.
    pub(crate) pending_flag_reset: Option<UnitFlags>,
    pub(crate) enabled_syscalls: SyscallBitmap,
    pub(crate) syscall: CurrentSyscall,
    /// Between entry and exit of a scribed syscall.
    pub(crate) in_syscall: bool,
    /// The return value is owed to the stream (recording) or has been
    /// consumed from it (replay).
    pub(crate) need_syscall_ret: bool,
    /// Variant chosen when the return value became owed.
    pub(crate) syscall_extra: bool,
    pub(crate) syscall_slot: Option<PendingSlot>,
    /// Recorded return value, during replay.
    pub(crate) orig_ret: i64,
    pub(crate) can_access_user_memory: bool,
    pub(crate) in_no_interrupt_window: bool,
    pub(crate) exiting: bool,
    pub(crate) stream: Arc<dyn EventStream>,
    pub(crate) session: SessionSharedPtr,
    pub(crate) signals: Box<dyn SignalSync>,
    pub(crate) memory: Box<dyn MemoryScribe>,
    pub(crate) bookmarks: Box<dyn Bookmarks>,
}

impl TracedUnit {
    /// `flags` may include mode bits; this is how a unit becomes scribed.
    pub fn new(
        pid: pid_t,
        flags: UnitFlags,
        session: &SessionSharedPtr,
        stream: Arc<dyn EventStream>,
        subsystems: Subsystems,
    ) -> TracedUnit {
        TracedUnit {
            pid,
            flags: SharedFlags::new(flags),
            pending_flag_reset: None,
            enabled_syscalls: SyscallBitmap::for_new_unit(),
            syscall: CurrentSyscall::default(),
            in_syscall: false,
            need_syscall_ret: false,
            syscall_extra: false,
            syscall_slot: None,
            orig_ret: 0,
            can_access_user_memory: false,
            in_no_interrupt_window: false,
            exiting: false,
            stream,
            session: session.clone(),
            signals: subsystems.signals,
            memory: subsystems.memory,
            bookmarks: subsystems.bookmarks,
        }
    }

    /// Child created by a fork-like syscall of this unit. It inherits the
    /// syscall filter verbatim and is mid-syscall like its parent, so it
    /// must go through `ret_from_fork()` before running.
    pub fn fork_child(
        &self,
        pid: pid_t,
        stream: Arc<dyn EventStream>,
        subsystems: Subsystems,
    ) -> TracedUnit {
        let mut child = TracedUnit::new(
            pid,
            self.flags() - UnitFlags::MUTATING - UnitFlags::STRICT_REPLAY,
            &self.session,
            stream,
            subsystems,
        );
        child.enabled_syscalls = self.enabled_syscalls.clone();
        child.syscall = self.syscall;
        child.can_access_user_memory = self.can_access_user_memory;
        child.in_no_interrupt_window = self.in_no_interrupt_window;
        log!(LogDebug, "{} forked child {}", self.pid, pid);
        child
    }

    /// Make the unit reachable from other units of the session.
    pub fn into_shared(self) -> UnitSharedPtr {
        let pid = self.pid;
        let session = self.session.clone();
        let flags = self.flags.clone();
        let shared = Arc::new(Mutex::new(self));
        session.register_unit(pid, &shared, flags);
        shared
    }

    pub fn pid(&self) -> pid_t {
        self.pid
    }

    pub fn flags(&self) -> UnitFlags {
        self.flags.get()
    }

    pub fn current_syscall(&self) -> &CurrentSyscall {
        &self.syscall
    }

    pub fn session(&self) -> &SessionSharedPtr {
        &self.session
    }

    pub fn stream(&self) -> &Arc<dyn EventStream> {
        &self.stream
    }

    pub fn enabled_syscalls(&self) -> &SyscallBitmap {
        &self.enabled_syscalls
    }

    pub fn pending_flag_reset(&self) -> Option<UnitFlags> {
        self.pending_flag_reset
    }

    pub fn is_in_syscall(&self) -> bool {
        self.in_syscall
    }

    pub fn owes_syscall_ret(&self) -> bool {
        self.need_syscall_ret
    }

    pub fn can_access_user_memory(&self) -> bool {
        self.can_access_user_memory
    }

    /// The unit is being torn down. Its last syscall never finalizes.
    pub fn set_exiting(&mut self) {
        self.exiting = true;
    }

    pub fn is_scribed(&self) -> bool {
        self.flags().is_scribed()
    }

    pub fn is_recording(&self) -> bool {
        self.flags().is_recording()
    }

    pub fn is_replaying(&self) -> bool {
        self.flags().is_replaying()
    }

    pub fn is_mutating(&self) -> bool {
        self.flags().is_mutating()
    }

    pub(crate) fn should_scribe_syscalls(&self) -> bool {
        self.is_scribed() && self.flags().contains(UnitFlags::ENABLE_SYSCALL)
    }

    pub(crate) fn should_bypass_syscall(&self) -> bool {
        !self.enabled_syscalls.is_enabled(self.syscall.nr)
    }

    pub(crate) fn should_scribe_mm(&self) -> bool {
        self.flags().contains(UnitFlags::ENABLE_MM)
    }

    pub(crate) fn should_scribe_regs(&self) -> bool {
        self.flags().contains(UnitFlags::ENABLE_REGS)
    }

    pub(crate) fn should_ret_check(&self) -> bool {
        self.flags().contains(UnitFlags::ENABLE_RET_CHECK)
    }

    pub(crate) fn should_scribe_syscall_extra(&self) -> bool {
        self.flags().contains(UnitFlags::ENABLE_SYSCALL_EXTRA)
    }

    pub(crate) fn should_strict_replay(&self) -> bool {
        self.flags().contains(UnitFlags::STRICT_REPLAY)
    }

    /// Where recorded events go: the unit's own stream, or the session's
    /// divergence stream while mutating.
    pub(crate) fn output_stream(&self) -> Arc<dyn EventStream> {
        if self.is_mutating() {
            self.session.divergence_stream()
        } else {
            self.stream.clone()
        }
    }

    pub(crate) fn acquire_user_access(&mut self) {
        if !self.can_access_user_memory {
            self.memory.acquire_user_access();
            self.can_access_user_memory = true;
        }
    }

    pub(crate) fn release_user_access(&mut self) {
        if self.can_access_user_memory {
            self.memory.release_user_access();
            self.can_access_user_memory = false;
        }
    }

    pub(crate) fn kill_session(&self, cause: ScribeError) -> ScribeError {
        self.session.kill(&cause);
        cause
    }

    /// Publish a divergence note. Notes are diagnostics: failing to queue
    /// one is logged and otherwise ignored.
    pub(crate) fn report_divergence(&self, note: Event) {
        log!(
            LogWarn,
            "unit {} diverged in {}: {}",
            self.pid,
            syscall_name(self.syscall.nr),
            note
        );
        if let Err(e) = self.session.divergences().enqueue(note) {
            log!(LogWarn, "dropping divergence note: {:?}", e);
        }
    }

    pub(crate) fn start_mutations(&mut self) {
        log!(
            LogInfo,
            "unit {} starts mutating at {}",
            self.pid,
            syscall_name(self.syscall.nr)
        );
        self.flags.insert(UnitFlags::MUTATING);
    }

    pub(crate) fn stop_mutations(&mut self) {
        log!(LogInfo, "unit {} stops mutating", self.pid);
        self.flags.remove(UnitFlags::MUTATING);
    }
}

impl Drop for TracedUnit {
    fn drop(&mut self) {
        self.session.unregister_unit(self.pid);
    }
}
