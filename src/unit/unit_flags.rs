use serde::{Deserialize, Serialize};
use std::{
    convert::TryFrom,
    sync::{
        atomic::{AtomicU32, Ordering},
        Arc,
    },
};

bitflags! {
    /// Mode and scribing switches of a traced unit.
    ///
    /// The low byte holds internal mode bits which only the engine itself
    /// may change. Requests coming from outside can only touch the
    /// `ENABLE_*` bits.
    pub struct UnitFlags: u32 {
        const RECORD = 0x0001;
        const REPLAY = 0x0002;
        /// Divergences fail the call instead of starting a mutation.
        const STRICT_REPLAY = 0x0004;
        /// The live execution departed from the trace and is being recorded
        /// as a mutation.
        const MUTATING = 0x0008;

        const ENABLE_SYSCALL = 0x0100;
        const ENABLE_DATA = 0x0200;
        const ENABLE_SIGNAL = 0x0400;
        const ENABLE_MM = 0x0800;
        const ENABLE_REGS = 0x1000;
        const ENABLE_RET_CHECK = 0x2000;
        const ENABLE_SYSCALL_EXTRA = 0x4000;

        const ENABLE_ALL = Self::ENABLE_SYSCALL.bits
            | Self::ENABLE_DATA.bits
            | Self::ENABLE_SIGNAL.bits
            | Self::ENABLE_MM.bits
            | Self::ENABLE_REGS.bits
            | Self::ENABLE_RET_CHECK.bits
            | Self::ENABLE_SYSCALL_EXTRA.bits;
    }
}

/// A unit's flags, readable by other units of the session without taking
/// the unit's lock. Only the owning unit writes them.
#[derive(Clone, Debug)]
pub struct SharedFlags(Arc<AtomicU32>);

impl SharedFlags {
    pub fn new(flags: UnitFlags) -> SharedFlags {
        SharedFlags(Arc::new(AtomicU32::new(flags.bits())))
    }

    pub fn get(&self) -> UnitFlags {
        UnitFlags::from_bits_truncate(self.0.load(Ordering::Acquire))
    }

    pub fn set(&self, flags: UnitFlags) {
        self.0.store(flags.bits(), Ordering::Release);
    }

    pub fn insert(&self, flags: UnitFlags) {
        self.0.fetch_or(flags.bits(), Ordering::AcqRel);
    }

    pub fn remove(&self, flags: UnitFlags) {
        self.0.fetch_and(!flags.bits(), Ordering::AcqRel);
    }
}

/// How long a flag change lasts.
#[repr(u8)]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Duration {
    Permanent = 0,
    /// Revert when the current (or next) syscall exits.
    UntilNextSyscall = 1,
}

impl TryFrom<u8> for Duration {
    type Error = u8;

    fn try_from(v: u8) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Duration::Permanent),
            1 => Ok(Duration::UntilNextSyscall),
            _ => Err(v),
        }
    }
}

impl UnitFlags {
    pub fn is_scribed(self) -> bool {
        self.intersects(UnitFlags::RECORD | UnitFlags::REPLAY)
    }

    /// Mutations are recorded, so a mutating unit counts as recording.
    pub fn is_recording(self) -> bool {
        self.intersects(UnitFlags::RECORD | UnitFlags::MUTATING)
    }

    pub fn is_replaying(self) -> bool {
        self.contains(UnitFlags::REPLAY) && !self.contains(UnitFlags::MUTATING)
    }

    pub fn is_mutating(self) -> bool {
        self.contains(UnitFlags::MUTATING)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn mutating_replay_counts_as_recording() {
        let f = UnitFlags::REPLAY | UnitFlags::ENABLE_ALL;
        assert!(f.is_replaying());
        assert!(!f.is_recording());
        let m = f | UnitFlags::MUTATING;
        assert!(m.is_recording());
        assert!(!m.is_replaying());
        assert!(m.is_scribed());
    }

    #[test]
    fn unscribed() {
        assert!(!UnitFlags::ENABLE_ALL.is_scribed());
        assert!(!UnitFlags::empty().is_recording());
    }

    #[test]
    fn enable_bits_exclude_mode_bits() {
        let mode = UnitFlags::RECORD | UnitFlags::REPLAY | UnitFlags::STRICT_REPLAY | UnitFlags::MUTATING;
        assert!(!UnitFlags::ENABLE_ALL.intersects(mode));
    }

    #[test]
    fn shared_flags_are_seen_through_every_handle() {
        let f = SharedFlags::new(UnitFlags::REPLAY | UnitFlags::ENABLE_SYSCALL);
        let view = f.clone();
        f.insert(UnitFlags::MUTATING);
        assert!(view.get().is_mutating());
        f.remove(UnitFlags::MUTATING | UnitFlags::ENABLE_SYSCALL);
        assert_eq!(view.get(), UnitFlags::REPLAY);
        f.set(UnitFlags::RECORD);
        assert!(view.get().is_recording());
    }

    #[test]
    fn durations() {
        assert_eq!(Duration::try_from(1), Ok(Duration::UntilNextSyscall));
        assert_eq!(Duration::try_from(2), Err(2));
    }
}
