use crate::kernel_abi::{x86, NR_SCRIBE_SYSCALLS};
use bit_field::BitArray;

const WORDS: usize = (NR_SCRIBE_SYSCALLS + 63) / 64;

/// Which syscall identities a unit scribes. Out-of-range identities are
/// never enabled.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SyscallBitmap {
    bits: [u64; WORDS],
}

impl SyscallBitmap {
    pub fn empty() -> SyscallBitmap {
        SyscallBitmap { bits: [0; WORDS] }
    }

    /// Everything enabled except `prctl`, which userspace uses to talk to
    /// the scribing machinery.
    pub fn for_new_unit() -> SyscallBitmap {
        let mut b = SyscallBitmap::empty();
        for nr in 0..NR_SCRIBE_SYSCALLS {
            b.bits[..].set_bit(nr, true);
        }
        b.bits[..].set_bit(x86::PRCTL as usize, false);
        b
    }

    pub fn in_universe(nr: i32) -> bool {
        0 <= nr && (nr as usize) < NR_SCRIBE_SYSCALLS
    }

    pub fn is_enabled(&self, nr: i32) -> bool {
        SyscallBitmap::in_universe(nr) && self.bits[..].get_bit(nr as usize)
    }

    /// Returns false if `nr` is outside the universe.
    pub fn set(&mut self, nr: i32, enable: bool) -> bool {
        if !SyscallBitmap::in_universe(nr) {
            return false;
        }
        self.bits[..].set_bit(nr as usize, enable);
        true
    }

    pub fn enabled_count(&self) -> u32 {
        self.bits.iter().map(|w| w.count_ones()).sum()
    }
}
