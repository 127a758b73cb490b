//! The syscall boundary protocol: what happens when a scribed unit enters
//! and leaves a syscall.

use super::identity::is_scribe_syscall;
use crate::{
    error::{Result, ScribeError},
    event::{Event, EventType},
    kernel_metadata::syscall_name,
    log::LogLevel::{LogDebug, LogInfo},
    registers::Registers,
    subsystems::BookmarkPoint,
    unit::{
        traced_unit::TracedUnit,
        unit_flags::{Duration, UnitFlags},
    },
};

impl TracedUnit {
    /// Called at syscall entry with the unit's registers.
    ///
    /// An error means the call must fail with `-err.errno()` without
    /// running. `exit_syscall()` must still be called for it.
    pub fn enter_syscall(&mut self, regs: &Registers) -> Result<()> {
        if !self.is_scribed() || self.session.is_killed() {
            return Ok(());
        }

        self.cache_syscall_info(regs);

        if is_scribe_syscall(self.syscall.nr) {
            return Ok(());
        }

        if !self.should_scribe_syscalls() || self.should_bypass_syscall() {
            log!(
                LogDebug,
                "unit {} bypasses {}",
                self.pid,
                syscall_name(self.syscall.nr)
            );
            // Keep signals reproducible; scribe nothing else for this call.
            let f = self.flags() & UnitFlags::ENABLE_SIGNAL;
            self.set_flags(f, Duration::UntilNextSyscall);
            return Ok(());
        }

        self.memory.reset_fence_numbering();
        self.need_syscall_ret = false;
        self.memory.enter_deterministic_data();

        let deferred = self.signals.enter_no_interrupt_window();
        self.in_no_interrupt_window = true;
        if deferred > 0 {
            log!(LogDebug, "unit {} deferred {} signals", self.pid, deferred);
        }

        if self.should_scribe_mm() {
            self.acquire_user_access();
        }

        self.handle_custom_actions();

        self.bookmarks.bookmark_point(BookmarkPoint::PreSyscall);
        if self.maybe_detach() {
            return Ok(());
        }

        self.in_syscall = true;
        if let Err(e) = self.request_syscall_ret() {
            self.need_syscall_ret = false;
            return Err(e);
        }

        if self.should_scribe_regs() && !self.is_mutating() {
            if let Err(e) = self.scribe_regs(regs) {
                self.need_syscall_ret = false;
                return Err(e);
            }
        }

        self.signals.recompute_pending();
        Ok(())
    }

    /// Called when the syscall returns, with the result in `regs`.
    pub fn exit_syscall(&mut self, regs: &Registers) {
        if !self.is_scribed() {
            return;
        }
        if self.session.is_killed() {
            self.abandon_syscall();
            return;
        }
        if is_scribe_syscall(self.syscall.nr) {
            return;
        }

        self.apply_pending_reset();

        if !self.in_syscall {
            return;
        }
        self.in_syscall = false;

        self.commit_syscall(regs.syscall_result_signed());

        if self.is_mutating() {
            self.stop_mutations();
        }

        self.finalize_syscall();
    }

    /// Make sure the return value of the current syscall is owed, ahead of
    /// the exit. Syscalls whose effects must be ordered after their result
    /// in the stream call this early.
    pub fn need_syscall_ret(&mut self) -> Result<()> {
        if !self.is_scribed() || !self.in_syscall || self.need_syscall_ret {
            return Ok(());
        }
        self.request_syscall_ret()
    }

    fn request_syscall_ret(&mut self) -> Result<()> {
        self.need_syscall_ret = true;
        if self.is_recording() {
            self.need_syscall_ret_record();
            Ok(())
        } else {
            self.need_syscall_ret_replay()
        }
    }

    /// Settle the return value: write it to the reserved slot when
    /// recording, check it against the recorded one when replaying. Does
    /// nothing when no return value is owed.
    pub fn commit_syscall(&mut self, ret: i64) {
        if !self.need_syscall_ret {
            return;
        }
        self.need_syscall_ret = false;

        if self.is_recording() {
            if let Err(e) = self.commit_syscall_record(ret) {
                self.kill_session(e);
            }
        } else {
            self.commit_syscall_replay(ret);
        }
    }

    fn commit_syscall_record(&mut self, ret: i64) -> Result<()> {
        let slot = match self.syscall_slot.take() {
            Some(slot) => slot,
            None => {
                return Err(ScribeError::ProtocolViolation(
                    "no reserved slot for the return value".into(),
                ))
            }
        };

        let event = if self.syscall_extra {
            Event::SyscallExtra {
                nr: self.syscall.nr,
                args: self.syscall.args().to_vec(),
                ret,
            }
        } else {
            Event::Syscall { ret }
        };
        slot.stream.fill_slot(slot.handle, event)?;
        slot.stream.commit_slot(slot.handle)?;

        if self.syscall_extra {
            slot.stream
                .enqueue(Event::SyscallEnd)
                .map_err(|_| ScribeError::ResourceExhaustion)?;
        }
        Ok(())
    }

    fn commit_syscall_replay(&mut self, ret: i64) {
        if self.syscall_extra {
            if let Err(e) = self.stream.dequeue_expecting(EventType::EvSyscallEnd) {
                log!(LogDebug, "no end marker for {}: {:?}", syscall_name(self.syscall.nr), e);
            }
        }
        if self.should_ret_check() && self.orig_ret != ret {
            log!(
                LogDebug,
                "{} returned {} instead of {}",
                syscall_name(self.syscall.nr),
                ret,
                self.orig_ret
            );
            self.report_divergence(Event::DivergeSyscallReturn { ret });
        }
    }

    /// Hand control back to the unit after a scribed syscall.
    pub(crate) fn finalize_syscall(&mut self) {
        self.bookmarks.bookmark_point(BookmarkPoint::PostSyscall);

        if self.maybe_detach() {
            return;
        }
        if self.exiting {
            return;
        }

        self.release_user_access();
        if self.in_no_interrupt_window {
            self.signals.leave_no_interrupt_window();
            self.in_no_interrupt_window = false;
        }
        self.signals.recompute_pending();

        unit_assert!(self, !self.can_access_user_memory);
    }

    /// The session died while the unit was inside a syscall. Nothing more is
    /// scribed, but what the unit holds is handed back.
    fn abandon_syscall(&mut self) {
        self.apply_pending_reset();
        self.in_syscall = false;
        self.need_syscall_ret = false;
        self.syscall_slot = None;
        if self.is_mutating() {
            self.stop_mutations();
        }
        if self.exiting {
            return;
        }
        self.release_user_access();
        if self.in_no_interrupt_window {
            self.signals.leave_no_interrupt_window();
            self.in_no_interrupt_window = false;
            self.signals.recompute_pending();
        }
    }

    /// First thing a fork child does, in place of the syscall exit.
    pub fn ret_from_fork(&mut self) {
        if !self.is_scribed() {
            return;
        }
        self.signals.resume_after_fork();
        self.finalize_syscall();
    }

    fn maybe_detach(&mut self) -> bool {
        if !self.session.is_detaching(self.pid) {
            return false;
        }
        self.detach();
        true
    }

    /// Stop scribing this unit. Any capability it holds is given back.
    fn detach(&mut self) {
        log!(LogInfo, "detaching unit {}", self.pid);
        self.release_user_access();
        if self.in_no_interrupt_window {
            self.signals.leave_no_interrupt_window();
            self.in_no_interrupt_window = false;
        }
        unit_assert!(self, self.syscall_slot.is_none(), "detaching with a reserved slot");
        self.flags.remove(
            UnitFlags::RECORD | UnitFlags::REPLAY | UnitFlags::STRICT_REPLAY | UnitFlags::MUTATING,
        );
        self.pending_flag_reset = None;
        self.in_syscall = false;
        self.need_syscall_ret = false;
        self.session.detach_done(self.pid);
        self.signals.recompute_pending();
    }
}

#[cfg(test)]
mod test {
    use crate::{
        event::Event,
        kernel_abi::{x86, SOCKETCALL_FIRST},
        registers::Registers,
        test_support::Harness,
        trace::{
            event_queue::EventQueue,
            event_stream::{EventStream, WaitMode},
        },
        unit::unit_flags::{Duration, UnitFlags},
    };
    use rand::{rngs::StdRng, Rng, SeedableRng};
    use std::sync::Arc;

    const GETPID: i32 = 20;

    #[test]
    fn recording_writes_extra_variant_and_end_marker() {
        let mut h = Harness::recording();
        h.syscall(x86::OPEN, &[0x0804_a000, 0], 3).unwrap();
        assert_eq!(
            h.stream.visible_events(),
            vec![
                Event::SyscallExtra {
                    nr: x86::OPEN,
                    args: vec![0x0804_a000, 0],
                    ret: 3,
                },
                Event::SyscallEnd,
            ]
        );
    }

    #[test]
    fn recording_plain_variant() {
        let mut h = Harness::recording();
        let f = h.unit.flags() - UnitFlags::ENABLE_SYSCALL_EXTRA;
        h.unit.set_flags(f, Duration::Permanent);
        h.syscall(GETPID, &[], 77).unwrap();
        assert_eq!(h.stream.visible_events(), vec![Event::Syscall { ret: 77 }]);
    }

    #[test]
    fn variant_is_fixed_when_the_return_value_becomes_owed() {
        let mut h = Harness::recording();
        h.enter(GETPID, &[]).unwrap();
        let f = h.unit.flags() - UnitFlags::ENABLE_SYSCALL_EXTRA;
        h.unit.set_flags(f, Duration::Permanent);
        h.exit(77);
        assert_eq!(
            h.stream.visible_events(),
            vec![
                Event::SyscallExtra {
                    nr: GETPID,
                    args: vec![],
                    ret: 77,
                },
                Event::SyscallEnd,
            ]
        );
    }

    #[test]
    fn events_of_the_call_follow_its_return_value() {
        let mut h = Harness::recording();
        h.enter(GETPID, &[]).unwrap();
        // Something the syscall body records, such as a data transfer.
        h.stream.enqueue(Event::Nop).unwrap();
        assert!(h.stream.visible_events().is_empty());
        h.exit(5);
        assert_eq!(
            h.stream.visible_events(),
            vec![
                Event::SyscallExtra {
                    nr: GETPID,
                    args: vec![],
                    ret: 5,
                },
                Event::Nop,
                Event::SyscallEnd,
            ]
        );
    }

    #[test]
    fn recorded_registers_are_normalized() {
        let mut h = Harness::recording();
        let f = h.unit.flags() | UnitFlags::ENABLE_REGS;
        h.unit.set_flags(f, Duration::Permanent);
        let mut regs = Registers::for_syscall(GETPID, &[]);
        regs.eflags = 0xffff_0246;
        h.enter_regs(&regs).unwrap();
        h.exit(1);
        let events = h.stream.visible_events();
        match &events[1] {
            Event::Regs { regs } => assert_eq!(regs.eflags, 0x246),
            other => panic!("expected registers, got {}", other),
        }
    }

    #[test]
    fn filtered_syscalls_produce_nothing() {
        let mut h = Harness::recording();
        h.unit.filter_syscall(GETPID, false).unwrap();
        let before = h.unit.flags();
        h.enter(GETPID, &[]).unwrap();
        assert!(!h.unit.is_in_syscall());
        assert_eq!(h.unit.flags() & UnitFlags::ENABLE_ALL, UnitFlags::ENABLE_SIGNAL);
        assert!(!h.unit.can_access_user_memory());
        h.exit(1);
        assert_eq!(h.unit.flags(), before);
        assert!(h.stream.is_empty());
        assert_eq!(h.spy.count("enter_no_interrupt_window"), 0);
    }

    #[test]
    fn prctl_is_not_scribed_by_default() {
        let mut h = Harness::recording();
        h.syscall(x86::PRCTL, &[15, 0], 0).unwrap();
        assert!(h.stream.is_empty());
    }

    #[test]
    fn unscribed_units_are_left_alone() {
        let mut h = Harness::with_flags(UnitFlags::ENABLE_ALL, EventQueue::new());
        h.syscall(GETPID, &[], 1).unwrap();
        assert!(h.stream.is_empty());
        assert!(h.spy.calls().is_empty());
    }

    #[test]
    fn entry_and_exit_coordinate_with_subsystems() {
        let mut h = Harness::recording();
        h.syscall(GETPID, &[], 1).unwrap();
        assert_eq!(
            h.spy.calls(),
            vec![
                "reset_fence_numbering",
                "enter_deterministic_data",
                "enter_no_interrupt_window",
                "acquire_user_access",
                "bookmark(PreSyscall)",
                "recompute_pending",
                "bookmark(PostSyscall)",
                "release_user_access",
                "leave_no_interrupt_window",
                "recompute_pending",
            ]
        );
    }

    #[test]
    fn user_access_is_not_taken_without_mm_scribing() {
        let mut h = Harness::recording();
        let f = h.unit.flags() - UnitFlags::ENABLE_MM;
        h.unit.set_flags(f, Duration::Permanent);
        h.enter(GETPID, &[]).unwrap();
        assert!(!h.unit.can_access_user_memory());
        h.exit(0);
        assert_eq!(h.spy.count("acquire_user_access"), 0);
    }

    #[test]
    fn control_syscalls_are_not_scribed() {
        let mut h = Harness::recording();
        h.syscall(crate::kernel_abi::NR_GET_SCRIBE_FLAGS, &[0, 0x0804_c000], 0)
            .unwrap();
        assert!(h.stream.is_empty());
        assert!(!h.unit.is_in_syscall());
    }

    #[test]
    fn early_return_request_is_idempotent() {
        let mut h = Harness::recording();
        h.enter(GETPID, &[]).unwrap();
        h.unit.need_syscall_ret().unwrap();
        h.unit.need_syscall_ret().unwrap();
        h.exit(9);
        assert_eq!(h.stream.visible_events().len(), 2);
    }

    #[test]
    fn commit_without_owed_return_does_nothing() {
        let mut h = Harness::recording();
        h.unit.commit_syscall(4);
        assert!(h.stream.is_empty());
    }

    #[test]
    fn return_value_mismatch_is_not_fatal() {
        let mut h = Harness::replaying(vec![
            Event::SyscallExtra {
                nr: GETPID,
                args: vec![],
                ret: 100,
            },
            Event::SyscallEnd,
        ]);
        h.syscall(GETPID, &[], 101).unwrap();
        assert_eq!(h.divergences(), vec![Event::DivergeSyscallReturn { ret: 101 }]);
        assert!(h.stream.is_empty());
    }

    #[test]
    fn return_check_can_be_disabled() {
        let mut h = Harness::replaying(vec![Event::Syscall { ret: 100 }]);
        let f = h.unit.flags() - UnitFlags::ENABLE_RET_CHECK - UnitFlags::ENABLE_SYSCALL_EXTRA;
        h.unit.set_flags(f, Duration::Permanent);
        h.syscall(GETPID, &[], 101).unwrap();
        assert!(h.divergences().is_empty());
    }

    #[test]
    fn failed_allocation_kills_the_session() {
        let mut h = Harness::with_flags(
            Harness::record_flags(),
            EventQueue::with_capacity(Some(1)),
        );
        h.syscall(GETPID, &[], 1).unwrap();
        assert!(h.session.is_killed());
        assert_eq!(h.session.kill_errno(), Some(libc::ENOMEM));
        // Nothing is scribed any more.
        h.enter(GETPID, &[]).unwrap();
        assert!(!h.unit.is_in_syscall());
    }

    #[test]
    fn killed_session_releases_what_the_call_holds() {
        let mut h = Harness::recording();
        let before = h.unit.flags();
        h.enter(GETPID, &[]).unwrap();
        let f = h.unit.flags() - UnitFlags::ENABLE_DATA;
        h.unit.set_flags(f, Duration::UntilNextSyscall);
        h.session.kill(&crate::error::ScribeError::ResourceExhaustion);
        h.exit(1);
        assert!(!h.unit.is_in_syscall());
        assert!(!h.unit.owes_syscall_ret());
        assert!(!h.unit.can_access_user_memory());
        assert_eq!(h.unit.flags(), before);
        assert_eq!(h.spy.count("release_user_access"), 1);
        assert_eq!(h.spy.count("leave_no_interrupt_window"), 1);
        // The reserved slot was never committed.
        assert!(h.stream.visible_events().is_empty());
    }

    #[test]
    fn detach_at_entry() {
        let mut h = Harness::recording();
        h.session.request_detach(h.unit.pid());
        h.enter(GETPID, &[]).unwrap();
        assert!(!h.unit.is_scribed());
        assert!(!h.unit.can_access_user_memory());
        assert!(!h.session.is_detaching(h.unit.pid()));
        h.exit(0);
        assert!(h.stream.is_empty());
    }

    #[test]
    fn detach_at_exit() {
        let mut h = Harness::recording();
        h.enter(GETPID, &[]).unwrap();
        h.session.request_detach(h.unit.pid());
        h.exit(0);
        assert!(!h.unit.is_scribed());
        assert!(!h.unit.can_access_user_memory());
        assert_eq!(h.stream.visible_events().len(), 2);
    }

    #[test]
    fn exiting_unit_keeps_its_window() {
        let mut h = Harness::recording();
        h.enter(x86::EXIT_GROUP, &[0]).unwrap();
        h.unit.set_exiting();
        h.exit(0);
        assert_eq!(h.spy.count("leave_no_interrupt_window"), 0);
        assert_eq!(h.stream.visible_events().len(), 2);
    }

    #[test]
    fn fork_child_finalizes_through_ret_from_fork() {
        let mut h = Harness::recording();
        h.unit.filter_syscall(x86::OPEN, false).unwrap();
        h.enter(x86::CLONE, &[0x11, 0, 0, 0, 0]).unwrap();

        let child_stream = Arc::new(EventQueue::new());
        let (subsystems, child_spy) = crate::test_support::spy_subsystems();
        let mut child = h.unit.fork_child(h.unit.pid() + 1, child_stream.clone(), subsystems);
        assert!(!child.enabled_syscalls().is_enabled(x86::OPEN));
        assert!(child.can_access_user_memory());

        child.ret_from_fork();
        assert!(!child.can_access_user_memory());
        assert_eq!(
            child_spy.calls(),
            vec![
                "resume_after_fork",
                "bookmark(PostSyscall)",
                "release_user_access",
                "leave_no_interrupt_window",
                "recompute_pending",
            ]
        );
        h.exit(h.unit.pid() as i64 + 1);
        assert!(child_stream.is_empty());
    }

    #[test]
    fn socketcall_sub_operations_are_filtered_separately() {
        let mut h = Harness::recording();
        h.memory.map_words(0x0804_9000, &[3, 0x0804_a000, 16]);
        h.unit.filter_syscall(SOCKETCALL_FIRST + 3, false).unwrap();
        // connect is filtered, socket is not.
        h.syscall(x86::SOCKETCALL, &[3, 0x0804_9000], 0).unwrap();
        assert!(h.stream.is_empty());
        h.syscall(x86::SOCKETCALL, &[1, 0x0804_9000], 4).unwrap();
        assert_eq!(
            h.stream.dequeue(WaitMode::NoWait),
            Ok(Event::SyscallExtra {
                nr: SOCKETCALL_FIRST + 1,
                args: vec![3, 0x0804_a000, 16],
                ret: 4,
            })
        );
    }

    /// Record a random program, then replay it with every pointer moved.
    #[test]
    fn random_programs_replay_without_divergence() {
        let mut rng = StdRng::seed_from_u64(0x5c21be);
        let calls: Vec<(i32, Vec<u64>, i64)> = (0..200)
            .map(|_| {
                let nr = [3, 4, 6, 20, 45, 54, 78, 91][rng.gen_range(0..8)];
                let n = crate::syscall::identity::num_args(nr, &Registers::default());
                let args = (0..n)
                    .map(|_| {
                        if rng.gen_bool(0.5) {
                            0x0800_0000 + rng.gen_range(0..0x1000_0000u64)
                        } else {
                            rng.gen_range(0..0x1000u64)
                        }
                    })
                    .collect();
                (nr, args, rng.gen_range(-40..4096i64))
            })
            .collect();

        let mut rec = Harness::recording();
        for (nr, args, ret) in &calls {
            rec.syscall(*nr, args, *ret).unwrap();
        }
        let (events, left) = rec.stream.drain();
        assert_eq!(left, 0);
        assert_eq!(events.len(), 2 * calls.len());

        let mut rep = Harness::replaying(events);
        for (nr, args, ret) in &calls {
            let moved: Vec<u64> = args
                .iter()
                .map(|a| {
                    if crate::syscall::divergence::looks_like_address(*a) {
                        a ^ 0x0040_0000
                    } else {
                        *a
                    }
                })
                .collect();
            rep.syscall(*nr, &moved, *ret).unwrap();
        }
        assert!(rep.divergences().is_empty());
        assert!(rep.stream.is_empty());
        assert!(!rep.unit.is_mutating());
    }
}
