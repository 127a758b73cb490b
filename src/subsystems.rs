//! Interfaces to the parts of the system the syscall protocol coordinates
//! with but doesn't own: signal delivery, memory scribing and bookmarks.

use std::collections::BTreeMap;

/// Signal delivery. Signals arriving inside a no-interrupt window are held
/// back until the window closes, so they land at reproducible points.
pub trait SignalSync: Send {
    /// Open the window. Returns the number of signals that were deferred.
    fn enter_no_interrupt_window(&mut self) -> usize;
    fn leave_no_interrupt_window(&mut self);
    /// Called in a fork child before its first return to user space.
    fn resume_after_fork(&mut self);
    /// Re-evaluate whether a signal should be delivered on return.
    fn recompute_pending(&mut self);
    /// Drop the pending-signal indication raised for the current call.
    fn clear_pending(&mut self);
}

/// Scribing of user memory accesses.
pub trait MemoryScribe: Send {
    /// While held, the engine, not the traced code, may touch user memory
    /// without it being scribed as a shared-memory access.
    fn acquire_user_access(&mut self);
    fn release_user_access(&mut self);
    fn notify_mode_changed(&mut self, mm_enabled: bool);
    fn reset_fence_numbering(&mut self);
    /// Subsequent data transfers of this call are deterministic.
    fn enter_deterministic_data(&mut self);
    /// Unscribed read of user memory. Fails on an unmapped range.
    fn read_user(&mut self, addr: u64, buf: &mut [u8]) -> Result<(), ()>;
    /// Unscribed write of user memory.
    fn write_user(&mut self, addr: u64, data: &[u8]) -> Result<(), ()>;
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum BookmarkPoint {
    PreSyscall,
    PostSyscall,
}

pub trait Bookmarks: Send {
    fn bookmark_point(&mut self, point: BookmarkPoint);
}

/// Everything a unit needs besides its event stream.
pub struct Subsystems {
    pub signals: Box<dyn SignalSync>,
    pub memory: Box<dyn MemoryScribe>,
    pub bookmarks: Box<dyn Bookmarks>,
}

impl Subsystems {
    /// No signals, no bookmarks, and a simulated address space.
    pub fn inert(memory: SimulatedMemory) -> Subsystems {
        Subsystems {
            signals: Box::new(NoSignals),
            memory: Box::new(memory),
            bookmarks: Box::new(NoBookmarks),
        }
    }
}

pub struct NoSignals;

impl SignalSync for NoSignals {
    fn enter_no_interrupt_window(&mut self) -> usize {
        0
    }
    fn leave_no_interrupt_window(&mut self) {}
    fn resume_after_fork(&mut self) {}
    fn recompute_pending(&mut self) {}
    fn clear_pending(&mut self) {}
}

pub struct NoBookmarks;

impl Bookmarks for NoBookmarks {
    fn bookmark_point(&mut self, _point: BookmarkPoint) {}
}

/// Sparse byte-addressed memory. Reads of bytes that were never written
/// fault, like an unmapped page would.
#[derive(Clone, Debug, Default)]
pub struct SimulatedMemory {
    bytes: BTreeMap<u64, u8>,
}

impl SimulatedMemory {
    pub fn new() -> SimulatedMemory {
        SimulatedMemory::default()
    }

    pub fn map(&mut self, addr: u64, data: &[u8]) {
        for (i, b) in data.iter().enumerate() {
            self.bytes.insert(addr + i as u64, *b);
        }
    }

    /// Store 32-bit words, as the traced unit would see them.
    pub fn map_words(&mut self, addr: u64, words: &[u32]) {
        for (i, w) in words.iter().enumerate() {
            self.map(addr + 4 * i as u64, &w.to_le_bytes());
        }
    }
}

impl MemoryScribe for SimulatedMemory {
    fn acquire_user_access(&mut self) {}
    fn release_user_access(&mut self) {}
    fn notify_mode_changed(&mut self, _mm_enabled: bool) {}
    fn reset_fence_numbering(&mut self) {}
    fn enter_deterministic_data(&mut self) {}

    fn read_user(&mut self, addr: u64, buf: &mut [u8]) -> Result<(), ()> {
        for (i, b) in buf.iter_mut().enumerate() {
            *b = *self.bytes.get(&(addr + i as u64)).ok_or(())?;
        }
        Ok(())
    }

    fn write_user(&mut self, addr: u64, data: &[u8]) -> Result<(), ()> {
        self.map(addr, data);
        Ok(())
    }
}
