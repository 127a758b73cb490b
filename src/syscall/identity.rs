//! Mapping of raw syscall numbers to scribe identities. The socketcall
//! and futex multiplexers are expanded so that each sub-operation can be
//! filtered and compared on its own.

use crate::{
    kernel_abi::{
        is_futex_identity,
        is_socketcall_identity,
        syscall_nr_to_meta,
        x86,
        FUTEX_FIRST,
        NR_GET_SCRIBE_FLAGS,
        NR_SCRIBE_FILTER_SYSCALL,
        SOCKETCALL_FIRST,
        SOCKET_NARGS,
    },
    log::LogLevel::LogDebug,
    registers::Registers,
    unit::traced_unit::{CurrentSyscall, TracedUnit},
};

/// Value of every argument of a socketcall whose argument array couldn't
/// be read.
pub const ARG_SENTINEL: u64 = 0xFFFF_FFFF;

/// The control surface is never scribed itself.
pub fn is_scribe_syscall(nr: i32) -> bool {
    NR_GET_SCRIBE_FLAGS <= nr && nr <= NR_SCRIBE_FILTER_SYSCALL
}

/// Identity of the syscall about to run. Multiplexers with an out of range
/// sub-operation keep their raw number.
pub fn syscall_identity(regs: &Registers) -> i32 {
    let nr = regs.original_syscallno();
    match nr {
        x86::SOCKETCALL => {
            let call = regs.arg(0);
            if call <= x86::SYS_SOCKETCALL_LAST {
                SOCKETCALL_FIRST + call as i32
            } else {
                nr
            }
        }
        x86::FUTEX => {
            let cmd = regs.arg(1) & x86::FUTEX_CMD_MASK;
            if cmd <= x86::FUTEX_LAST_CMD {
                FUTEX_FIRST + cmd as i32
            } else {
                nr
            }
        }
        _ => nr,
    }
}

/// Number of arguments that are compared and recorded for `nr`.
pub fn num_args(nr: i32, regs: &Registers) -> usize {
    if is_socketcall_identity(nr) {
        return SOCKET_NARGS[(nr - SOCKETCALL_FIRST) as usize] as usize;
    }
    if is_futex_identity(nr) {
        return 6;
    }
    if nr == x86::OPEN && regs.arg(1) & x86::O_CREAT == 0 {
        // Without O_CREAT the mode argument is garbage.
        return 2;
    }
    match syscall_nr_to_meta(nr) {
        Some(meta) => meta.nb_args as usize,
        None => 0,
    }
}

/// Resolve the identity and arguments of the call described by `regs`.
/// Socketcall arguments live in user memory; `read_user` fetches them.
pub fn resolve<F>(regs: &Registers, read_user: F) -> CurrentSyscall
where
    F: FnOnce(u64, &mut [u8]) -> Result<(), ()>,
{
    let nr = syscall_identity(regs);
    let n = num_args(nr, regs);
    let mut args = [0u64; 6];

    if is_socketcall_identity(nr) {
        let mut raw = [0u8; 6 * x86::WORD_SIZE];
        let raw = &mut raw[..n * x86::WORD_SIZE];
        match read_user(regs.arg(1), raw) {
            Ok(()) => {
                for (a, w) in args.iter_mut().zip(raw.chunks_exact(x86::WORD_SIZE)) {
                    *a = u32::from_le_bytes([w[0], w[1], w[2], w[3]]) as u64;
                }
            }
            Err(()) => {
                for a in args.iter_mut().take(n) {
                    *a = ARG_SENTINEL;
                }
            }
        }
    } else {
        for (i, a) in args.iter_mut().enumerate().take(n) {
            *a = regs.arg(i);
        }
    }

    CurrentSyscall {
        nr,
        num_args: n,
        args,
    }
}

impl TracedUnit {
    /// Cache identity and arguments for the syscall being entered.
    pub(crate) fn cache_syscall_info(&mut self, regs: &Registers) {
        let memory = &mut self.memory;
        self.syscall = resolve(regs, |addr, buf| memory.read_user(addr, buf));
        log!(
            LogDebug,
            "unit {} enters {}{:x?}",
            self.pid,
            crate::kernel_metadata::syscall_name(self.syscall.nr),
            self.syscall.args()
        );
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        kernel_abi::{FUTEX_LAST, NR_SCRIBE_RECV_EVENT, SOCKETCALL_LAST},
        subsystems::{MemoryScribe, SimulatedMemory},
    };

    fn no_memory(_: u64, _: &mut [u8]) -> Result<(), ()> {
        Err(())
    }

    #[test]
    fn plain_syscalls_keep_their_number() {
        let regs = Registers::for_syscall(3, &[1, 2, 3]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.nr, 3);
        assert_eq!(c.args(), &[1, 2, 3]);
    }

    #[test]
    fn socketcall_expands_and_reads_arguments() {
        let mut mem = SimulatedMemory::new();
        mem.map_words(0x0804_9000, &[3, 0x0804_a000, 16]);
        // connect(fd, addr, len)
        let regs = Registers::for_syscall(x86::SOCKETCALL, &[3, 0x0804_9000]);
        let c = resolve(&regs, |a, b| mem.read_user(a, b));
        assert_eq!(c.nr, SOCKETCALL_FIRST + 3);
        assert_eq!(c.args(), &[3, 0x0804_a000, 16]);
        assert_eq!(c.args[3], 0);
    }

    #[test]
    fn socketcall_selector_zero_has_its_own_identity() {
        let regs = Registers::for_syscall(x86::SOCKETCALL, &[0, 0x0804_9000]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.nr, SOCKETCALL_FIRST);
        assert_eq!(c.num_args, 0);
        assert_eq!(
            crate::kernel_metadata::syscall_name(c.nr),
            "socketcall(0)"
        );
    }

    #[test]
    fn unreadable_socketcall_arguments_become_sentinels() {
        let regs = Registers::for_syscall(x86::SOCKETCALL, &[1, 0x1000]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.nr, SOCKETCALL_FIRST + 1);
        assert_eq!(c.args(), &[ARG_SENTINEL; 3]);
    }

    #[test]
    fn out_of_range_subcalls_stay_raw() {
        let regs = Registers::for_syscall(x86::SOCKETCALL, &[20, 0]);
        assert_eq!(syscall_identity(&regs), x86::SOCKETCALL);
        assert_eq!(
            syscall_identity(&Registers::for_syscall(x86::SOCKETCALL, &[19, 0])),
            SOCKETCALL_LAST
        );
        let regs = Registers::for_syscall(x86::FUTEX, &[0, 13]);
        assert_eq!(syscall_identity(&regs), x86::FUTEX);
    }

    #[test]
    fn futex_ignores_private_and_clock_bits() {
        let op = 1 | x86::FUTEX_PRIVATE_FLAG | x86::FUTEX_CLOCK_REALTIME;
        let regs = Registers::for_syscall(x86::FUTEX, &[0x1000, op, 1, 0, 0, 0]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.nr, FUTEX_FIRST + 1);
        assert_eq!(c.num_args, 6);
        let regs = Registers::for_syscall(x86::FUTEX, &[0x1000, 12]);
        assert_eq!(syscall_identity(&regs), FUTEX_LAST);
    }

    #[test]
    fn open_without_create_has_two_arguments() {
        let regs = Registers::for_syscall(x86::OPEN, &[0x0804_a000, 0, 0xdead]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.num_args, 2);
        let regs = Registers::for_syscall(x86::OPEN, &[0x0804_a000, x86::O_CREAT, 0o644]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.num_args, 3);
        assert_eq!(c.args[2], 0o644);
    }

    #[test]
    fn unknown_syscalls_have_no_arguments() {
        let regs = Registers::for_syscall(9999, &[1, 2, 3]);
        let c = resolve(&regs, no_memory);
        assert_eq!(c.nr, 9999);
        assert_eq!(c.num_args, 0);
        assert!(c.args().is_empty());
    }

    #[test]
    fn control_surface_identities() {
        assert!(is_scribe_syscall(NR_GET_SCRIBE_FLAGS));
        assert!(is_scribe_syscall(NR_SCRIBE_RECV_EVENT));
        assert!(!is_scribe_syscall(SOCKETCALL_FIRST));
        assert!(!is_scribe_syscall(x86::OPEN));
    }
}
