use crate::{
    error::{Result, ScribeError},
    event::{Event, EventType},
    kernel_abi::{is_exit_syscall, is_process_creation_syscall},
    log::LogLevel::LogDebug,
    registers::Registers,
    trace::event_stream::{StreamError, WaitMode},
    unit::{
        traced_unit::{PendingSlot, TracedUnit},
        unit_flags::{Duration, UnitFlags},
    },
};

/// Heuristic for "this argument is a user-space pointer". Pointers differ
/// from run to run, so they are never compared.
pub fn looks_like_address(value: u64) -> bool {
    value & 0xFF80_0000 != 0
}

/// Compare recorded and live arguments, skipping pairs where both values
/// look like addresses.
pub fn args_match(recorded: &[u64], live: &[u64]) -> bool {
    recorded.len() == live.len()
        && recorded
            .iter()
            .zip(live.iter())
            .all(|(r, l)| r == l || (looks_like_address(*r) && looks_like_address(*l)))
}

impl TracedUnit {
    fn diverge_syscall_note(&self) -> Event {
        Event::DivergeSyscall {
            nr: self.syscall.nr,
            num_args: self.syscall.num_args as u8,
            args: self.syscall.args,
        }
    }

    /// Reserve the slot the return value will be written to at exit.
    pub(crate) fn need_syscall_ret_record(&mut self) {
        unit_assert!(self, self.syscall_slot.is_none(), "slot already reserved");
        self.syscall_extra = self.should_scribe_syscall_extra();
        let stream = self.output_stream();
        let handle = stream.reserve_slot();
        self.syscall_slot = Some(PendingSlot { stream, handle });
    }

    /// Consume the recorded return value of the current syscall, checking
    /// that the recorded call is the one being made.
    pub(crate) fn need_syscall_ret_replay(&mut self) -> Result<()> {
        self.syscall_extra = self.should_scribe_syscall_extra();

        if !self.syscall_extra {
            let found = match self.stream.dequeue_expecting(EventType::EvSyscall) {
                Ok(Event::Syscall { ret }) => {
                    self.orig_ret = ret;
                    return Ok(());
                }
                Ok(other) => other.to_string(),
                Err(StreamError::Unexpected(ty)) => format!("a {} event", ty),
                Err(StreamError::Empty) => "the end of the trace".to_owned(),
                Err(e) => return Err(ScribeError::from(e)),
            };
            // The plain variant carries nothing to resume from.
            self.report_divergence(self.diverge_syscall_note());
            return Err(ScribeError::ProtocolViolation(format!(
                "expected a syscall event, found {}",
                found
            )));
        }

        match self.stream.peek(WaitMode::Wait) {
            Ok(Event::SyscallExtra { nr, args, ret }) => {
                if nr == self.syscall.nr && args_match(&args, self.syscall.args()) {
                    let _ = self.stream.dequeue(WaitMode::NoWait);
                    self.orig_ret = ret;
                    return Ok(());
                }
                log!(
                    LogDebug,
                    "recorded {} does not match live call",
                    Event::SyscallExtra { nr, args, ret }
                );
            }
            Ok(other) => log!(LogDebug, "expected a syscall, found {}", other),
            Err(e) => log!(LogDebug, "no recorded syscall: {:?}", e),
        }
        self.diverge_on_syscall()
    }

    fn diverge_on_syscall(&mut self) -> Result<()> {
        let nr = self.syscall.nr;
        // The recorded execution can't be followed into a child it never
        // created.
        let forced_strict =
            is_process_creation_syscall(nr) && !self.flags().contains(UnitFlags::STRICT_REPLAY);
        if forced_strict {
            self.flags.insert(UnitFlags::STRICT_REPLAY);
        }

        let result = if self.should_strict_replay() {
            let _ = self.stream.dequeue(WaitMode::NoWait);
            self.report_divergence(self.diverge_syscall_note());
            Err(ScribeError::divergence(
                nr,
                "live syscall does not match the recorded one",
            ))
        } else {
            let exiting = is_exit_syscall(nr);
            if !exiting {
                self.start_mutations();
            }
            self.report_divergence(self.diverge_syscall_note());
            if exiting {
                // Nothing will read this return value.
                self.syscall_extra = false;
            } else {
                // Before narrowing, so the mutation keeps the unit's variant.
                self.need_syscall_ret_record();
            }
            self.set_flags(UnitFlags::ENABLE_DATA, Duration::UntilNextSyscall);
            self.orig_ret = 0;
            Ok(())
        };

        if forced_strict {
            self.flags.remove(UnitFlags::STRICT_REPLAY);
        }
        result
    }

    /// Record the register snapshot, or compare it with the recorded one.
    pub(crate) fn scribe_regs(&mut self, regs: &Registers) -> Result<()> {
        let regs = regs.normalized();
        if self.is_recording() {
            return self
                .output_stream()
                .enqueue(Event::Regs { regs })
                .map_err(|_| self.kill_session(ScribeError::ResourceExhaustion));
        }

        match self.stream.dequeue_expecting(EventType::EvRegs) {
            Ok(Event::Regs { regs: recorded }) => {
                if recorded.normalized() == regs {
                    Ok(())
                } else {
                    self.report_divergence(Event::DivergeRegs { regs });
                    Err(ScribeError::divergence(
                        self.syscall.nr,
                        "registers differ from the recorded ones",
                    ))
                }
            }
            Ok(other) => Err(ScribeError::ProtocolViolation(format!(
                "expected registers, got {}",
                other
            ))),
            Err(e) => Err(ScribeError::from(e)),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        error::EDIVERGE,
        kernel_abi::x86,
        test_support::Harness,
        trace::event_stream::EventStream,
    };

    const PATH: u64 = 0x0804_a000;

    #[test]
    fn address_heuristic() {
        assert!(looks_like_address(0x0080_0000));
        assert!(looks_like_address(0xbfff_f000));
        assert!(!looks_like_address(0x007f_ffff));
        assert!(!looks_like_address(3));
    }

    #[test]
    fn pointers_may_move_but_scalars_may_not() {
        assert!(args_match(&[0x1000_0000, 5], &[0x2000_0000, 5]));
        assert!(!args_match(&[0x1000_0000, 5], &[0x2000_0000, 6]));
        assert!(!args_match(&[0x1000_0000], &[7]));
        assert!(!args_match(&[1, 2], &[1]));
    }

    fn recorded_open(ret: i64) -> Vec<Event> {
        vec![
            Event::SyscallExtra {
                nr: x86::OPEN,
                args: vec![PATH, 0],
                ret,
            },
            Event::SyscallEnd,
        ]
    }

    #[test]
    fn matching_call_consumes_the_recorded_return() {
        let mut h = Harness::replaying(recorded_open(3));
        h.enter(x86::OPEN, &[0x0900_0000, 0, 0x1234]).unwrap();
        assert!(!h.unit.is_mutating());
        h.exit(3);
        assert!(h.stream.visible_events().is_empty());
        assert!(h.divergences().is_empty());
    }

    #[test]
    fn different_scalar_argument_starts_a_mutation() {
        let mut h = Harness::replaying(recorded_open(3));
        h.enter(x86::OPEN, &[PATH, 2]).unwrap();
        assert!(h.unit.is_mutating());
        assert_eq!(
            h.unit.flags() & UnitFlags::ENABLE_ALL,
            UnitFlags::ENABLE_DATA
        );
        h.exit(5);
        assert!(!h.unit.is_mutating());

        let divs = h.divergences();
        assert_eq!(
            divs[0],
            Event::DivergeSyscall {
                nr: x86::OPEN,
                num_args: 2,
                args: [PATH, 2, 0, 0, 0, 0],
            }
        );
        // The mutated call itself is recorded on the divergence stream, in
        // the variant the unit records with.
        assert_eq!(
            divs[1],
            Event::SyscallExtra {
                nr: x86::OPEN,
                args: vec![PATH, 2],
                ret: 5,
            }
        );
        assert_eq!(divs[2], Event::SyscallEnd);
        // The recorded call is still waiting to be matched.
        assert_eq!(h.stream.visible_events(), recorded_open(3));
        assert_eq!(h.unit.flags(), Harness::replay_flags());
    }

    #[test]
    fn strict_replay_fails_the_call() {
        let mut h = Harness::replaying(recorded_open(3));
        h.unit.flags.insert(UnitFlags::STRICT_REPLAY);
        let err = h.enter(x86::OPEN, &[PATH, 2]).unwrap_err();
        assert!(err.is_divergence());
        assert_eq!(err.errno(), EDIVERGE);
        assert!(!h.unit.is_mutating());
        h.exit(-(EDIVERGE as i64));
        // The mismatched call was consumed, its end marker is left.
        assert_eq!(h.stream.visible_events(), vec![Event::SyscallEnd]);
        assert_eq!(h.divergences().len(), 1);
        assert!(!h.unit.can_access_user_memory());
    }

    #[test]
    fn diverging_fork_is_always_strict() {
        let mut h = Harness::replaying(recorded_open(3));
        let err = h.enter(x86::CLONE, &[0x11, 0]).unwrap_err();
        assert!(err.is_divergence());
        assert!(!h.unit.is_mutating());
        assert!(!h.unit.flags().contains(UnitFlags::STRICT_REPLAY));
        h.exit(-(EDIVERGE as i64));
    }

    #[test]
    fn diverging_exit_does_not_mutate() {
        let mut h = Harness::replaying(recorded_open(3));
        h.enter(x86::EXIT_GROUP, &[0]).unwrap();
        assert!(!h.unit.is_mutating());
        assert_eq!(h.divergences().len(), 1);
        assert_eq!(h.stream.visible_events(), recorded_open(3));
    }

    #[test]
    fn end_of_trace_is_a_divergence() {
        let mut h = Harness::replaying(vec![]);
        h.enter(x86::OPEN, &[PATH, 0]).unwrap();
        assert!(h.unit.is_mutating());
        h.exit(3);
        assert_eq!(h.divergences().len(), 3);
    }

    fn plain_replay(events: Vec<Event>) -> Harness {
        let mut h = Harness::replaying(events);
        let f = h.unit.flags() - UnitFlags::ENABLE_SYSCALL_EXTRA;
        h.unit.set_flags(f, Duration::Permanent);
        h
    }

    #[test]
    fn plain_variant_mismatch_is_a_protocol_violation() {
        let mut h = plain_replay(vec![Event::SyscallEnd]);
        let err = h.syscall(20, &[], 1).unwrap_err();
        assert!(matches!(err, ScribeError::ProtocolViolation(_)));
        assert!(err.is_divergence());
        assert_eq!(err.errno(), EDIVERGE);
        assert_eq!(
            h.divergences(),
            vec![Event::DivergeSyscall {
                nr: 20,
                num_args: 0,
                args: [0; 6],
            }]
        );
        assert!(!h.unit.can_access_user_memory());
    }

    #[test]
    fn plain_variant_end_of_trace_is_a_divergence() {
        let mut h = plain_replay(vec![Event::Syscall { ret: 7 }]);
        h.syscall(20, &[], 7).unwrap();
        let err = h.syscall(20, &[], 7).unwrap_err();
        assert!(err.is_divergence());
        assert_eq!(err.errno(), EDIVERGE);
        assert_eq!(h.divergences().len(), 1);
        assert!(!h.unit.is_mutating());
    }

    #[test]
    fn register_mismatch_is_reported() {
        let mut regs = Registers::for_syscall(20, &[]);
        regs.esp = 0xbfff_f000;
        let mut recorded = regs;
        recorded.xgs = 0xffff_0033;
        regs.xgs = 0x33;

        let mut h = Harness::replaying(vec![
            Event::Syscall { ret: 100 },
            Event::Regs { regs: recorded },
            Event::Syscall { ret: 100 },
            Event::Regs { regs: recorded },
        ]);
        let f = (h.unit.flags() - UnitFlags::ENABLE_SYSCALL_EXTRA) | UnitFlags::ENABLE_REGS;
        h.unit.set_flags(f, Duration::Permanent);

        // Only the noise bits differ.
        h.enter_regs(&regs).unwrap();
        h.exit(100);

        regs.eip = 0x0804_8000;
        let err = h.enter_regs(&regs).unwrap_err();
        assert!(err.is_divergence());
        assert!(matches!(h.divergences()[0], Event::DivergeRegs { .. }));
    }

    #[test]
    fn registers_are_not_checked_while_mutating() {
        let mut h = Harness::replaying(recorded_open(3));
        let f = h.unit.flags() | UnitFlags::ENABLE_REGS;
        h.unit.set_flags(f, Duration::Permanent);
        h.enter(x86::OPEN, &[PATH, 2]).unwrap();
        assert!(h.unit.is_mutating());
        h.exit(3);
        assert!(!h
            .divergences()
            .iter()
            .any(|e| matches!(e, Event::DivergeRegs { .. } | Event::Regs { .. })));
        let _ = h.stream.peek(WaitMode::NoWait).unwrap();
    }
}
