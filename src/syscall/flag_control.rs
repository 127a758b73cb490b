use crate::{
    event::Event,
    log::LogLevel::LogDebug,
    trace::event_stream::WaitMode,
    unit::{
        traced_unit::TracedUnit,
        unit_flags::{Duration, UnitFlags},
    },
};

impl TracedUnit {
    /// Replace the unit's enable bits with those of `new_flags`. Mode bits
    /// in `new_flags` are ignored.
    ///
    /// With `UntilNextSyscall` the previous flags come back when the
    /// current or next syscall exits. Nested scoped changes keep the
    /// earliest snapshot, so the outermost state is what gets restored.
    pub fn set_flags(&mut self, new_flags: UnitFlags, duration: Duration) {
        let old_flags = self.flags();
        let old_mm = old_flags.contains(UnitFlags::ENABLE_MM);
        let new_mm = new_flags.contains(UnitFlags::ENABLE_MM);

        match duration {
            Duration::UntilNextSyscall => {
                if self.pending_flag_reset.is_none() {
                    self.pending_flag_reset = Some(old_flags);
                }
                self.signals.clear_pending();
            }
            Duration::Permanent => self.pending_flag_reset = None,
        }

        if old_mm && !new_mm {
            self.release_user_access();
        }
        unit_assert!(self, !(self.can_access_user_memory && !new_mm));

        self.flags
            .set((old_flags - UnitFlags::ENABLE_ALL) | (new_flags & UnitFlags::ENABLE_ALL));

        if old_mm != new_mm {
            self.memory.notify_mode_changed(new_mm);
        }
        log!(
            LogDebug,
            "unit {} flags {:?} -> {:?} ({:?})",
            self.pid,
            old_flags,
            self.flags(),
            duration
        );
    }

    /// Undo a scoped flag change, if one is pending.
    pub(crate) fn apply_pending_reset(&mut self) {
        if let Some(saved) = self.pending_flag_reset.take() {
            self.set_flags(saved, Duration::Permanent);
        }
    }

    /// During replay, apply a `SetFlags` event sitting at the head of the
    /// stream, and drop the `Nop`s that follow it.
    pub(crate) fn handle_custom_actions(&mut self) {
        if !self.is_replaying() {
            return;
        }
        match self.stream.peek(WaitMode::Wait) {
            Ok(Event::SetFlags { flags, duration }) => {
                self.set_flags(UnitFlags::from_bits_truncate(flags), duration);
            }
            _ => return,
        }
        let _ = self.stream.dequeue(WaitMode::NoWait);
        while let Ok(Event::Nop) = self.stream.peek(WaitMode::Wait) {
            let _ = self.stream.dequeue(WaitMode::NoWait);
        }
    }
}

#[cfg(test)]
mod test {
    use crate::{
        event::Event,
        test_support::Harness,
        trace::event_stream::EventStream,
        unit::unit_flags::{Duration, UnitFlags},
    };

    #[test]
    fn scoped_change_is_restored_at_exit() {
        let mut h = Harness::recording();
        let before = h.unit.flags();
        h.unit.set_flags(UnitFlags::ENABLE_SIGNAL, Duration::UntilNextSyscall);
        assert_eq!(h.unit.flags() & UnitFlags::ENABLE_ALL, UnitFlags::ENABLE_SIGNAL);
        assert!(h.unit.flags().contains(UnitFlags::RECORD));

        h.syscall(20, &[], 100).unwrap();
        assert_eq!(h.unit.flags(), before);
        assert_eq!(h.unit.pending_flag_reset(), None);
    }

    #[test]
    fn nested_scoped_changes_restore_the_outermost_state() {
        let mut h = Harness::recording();
        let before = h.unit.flags();
        h.unit.set_flags(UnitFlags::ENABLE_SYSCALL, Duration::UntilNextSyscall);
        h.unit.set_flags(UnitFlags::ENABLE_DATA, Duration::UntilNextSyscall);
        assert_eq!(h.unit.pending_flag_reset(), Some(before));
        h.syscall(20, &[], 100).unwrap();
        assert_eq!(h.unit.flags(), before);
    }

    #[test]
    fn permanent_change_cancels_pending_reset() {
        let mut h = Harness::recording();
        h.unit.set_flags(UnitFlags::ENABLE_DATA, Duration::UntilNextSyscall);
        h.unit.set_flags(UnitFlags::ENABLE_SYSCALL, Duration::Permanent);
        assert_eq!(h.unit.pending_flag_reset(), None);
        h.syscall(20, &[], 100).unwrap();
        assert_eq!(
            h.unit.flags(),
            UnitFlags::RECORD | UnitFlags::ENABLE_SYSCALL
        );
    }

    #[test]
    fn mode_bits_cannot_be_set_from_outside() {
        let mut h = Harness::recording();
        h.unit.set_flags(
            UnitFlags::REPLAY | UnitFlags::MUTATING | UnitFlags::ENABLE_SYSCALL,
            Duration::Permanent,
        );
        assert_eq!(h.unit.flags(), UnitFlags::RECORD | UnitFlags::ENABLE_SYSCALL);
    }

    #[test]
    fn disabling_mm_gives_up_user_access() {
        let mut h = Harness::recording();
        h.enter(20, &[]).unwrap();
        assert!(h.unit.can_access_user_memory());
        let f = h.unit.flags() - UnitFlags::ENABLE_MM;
        h.unit.set_flags(f, Duration::Permanent);
        assert!(!h.unit.can_access_user_memory());
        assert_eq!(h.spy.count("release_user_access"), 1);
        assert_eq!(h.spy.count("notify_mode_changed(false)"), 1);
        h.exit(100);
        assert_eq!(h.spy.count("release_user_access"), 1);
    }

    #[test]
    fn set_flags_event_is_applied_during_replay() {
        let mut h = Harness::replaying(vec![
            Event::SetFlags {
                flags: UnitFlags::ENABLE_SYSCALL.bits(),
                duration: Duration::UntilNextSyscall,
            },
            Event::Nop,
            Event::Nop,
            Event::Syscall { ret: 100 },
        ]);
        let before = h.unit.flags();
        h.enter(20, &[]).unwrap();
        assert_eq!(
            h.unit.flags(),
            UnitFlags::REPLAY | UnitFlags::ENABLE_SYSCALL
        );
        h.exit(100);
        assert_eq!(h.unit.flags(), before);
        assert!(h.stream.visible_events().is_empty());
        assert!(h.divergences().is_empty());
    }

    #[test]
    fn custom_actions_are_ignored_while_recording() {
        let mut h = Harness::recording();
        h.stream
            .enqueue(Event::SetFlags {
                flags: 0,
                duration: Duration::Permanent,
            })
            .unwrap();
        h.enter(20, &[]).unwrap();
        assert!(h.unit.flags().contains(UnitFlags::ENABLE_SYSCALL));
    }
}
