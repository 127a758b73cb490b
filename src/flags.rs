use crate::unit::unit_flags::UnitFlags;
use std::sync::RwLock;

lazy_static! {
    static ref FLAGS: RwLock<Flags> = RwLock::new(Flags::default());
}

/// Process-wide settings, filled in from the command line before any unit
/// is created.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Flags {
    /// Record and compare register snapshots at every syscall entry.
    pub check_regs: bool,
    /// Record the plain syscall variant (return value only).
    pub no_syscall_extra: bool,
    /// Don't compare return values during replay.
    pub no_ret_check: bool,
    /// Any divergence fails the diverging call instead of starting a
    /// mutation.
    pub strict_replay: bool,
    /// Cap on the number of events a recording stream may hold.
    pub max_events: Option<usize>,
    /// Any warning or error that would be printed is treated as fatal
    pub fatal_errors_and_warnings: bool,
}

impl Default for Flags {
    fn default() -> Self {
        Flags {
            check_regs: false,
            no_syscall_extra: false,
            no_ret_check: false,
            strict_replay: false,
            max_events: None,
            fatal_errors_and_warnings: false,
        }
    }
}

impl Flags {
    /// A copy of the current settings. Defaults until `init()` is called.
    pub fn get() -> Flags {
        FLAGS.read().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn init(flags: Flags) {
        *FLAGS.write().unwrap_or_else(|e| e.into_inner()) = flags;
    }

    /// Enable bits a freshly created unit starts with.
    pub fn initial_enable_flags(&self) -> UnitFlags {
        let mut f = UnitFlags::ENABLE_ALL;
        if !self.check_regs {
            f.remove(UnitFlags::ENABLE_REGS);
        }
        if self.no_syscall_extra {
            f.remove(UnitFlags::ENABLE_SYSCALL_EXTRA);
        }
        if self.no_ret_check {
            f.remove(UnitFlags::ENABLE_RET_CHECK);
        }
        f
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn initial_enable_flags() {
        let f = Flags::default().initial_enable_flags();
        assert!(f.contains(UnitFlags::ENABLE_SYSCALL | UnitFlags::ENABLE_SYSCALL_EXTRA));
        assert!(!f.contains(UnitFlags::ENABLE_REGS));

        let f = Flags {
            check_regs: true,
            no_syscall_extra: true,
            no_ret_check: true,
            ..Flags::default()
        }
        .initial_enable_flags();
        assert!(f.contains(UnitFlags::ENABLE_REGS));
        assert!(!f.contains(UnitFlags::ENABLE_SYSCALL_EXTRA));
        assert!(!f.contains(UnitFlags::ENABLE_RET_CHECK));
    }
}
