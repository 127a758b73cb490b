//! Spy subsystems and a single-unit harness for driving the syscall
//! protocol from tests.

use crate::{
    error::Result,
    event::Event,
    registers::Registers,
    session::{Session, SessionSharedPtr},
    subsystems::{BookmarkPoint, Bookmarks, MemoryScribe, SignalSync, SimulatedMemory, Subsystems},
    trace::event_queue::EventQueue,
    unit::{traced_unit::TracedUnit, unit_flags::UnitFlags},
};
use std::sync::{Arc, Mutex};

/// Shared log of subsystem calls.
#[derive(Clone, Default)]
pub struct Spy {
    calls: Arc<Mutex<Vec<String>>>,
}

impl Spy {
    fn record<S: Into<String>>(&self, call: S) {
        self.calls.lock().unwrap().push(call.into());
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| *c == call).count()
    }
}

/// Memory of the simulated unit, reachable from the test after the unit
/// took ownership of its `MemoryScribe`.
#[derive(Clone, Default)]
pub struct SharedMemory(Arc<Mutex<SimulatedMemory>>);

impl SharedMemory {
    pub fn map(&self, addr: u64, data: &[u8]) {
        self.0.lock().unwrap().map(addr, data);
    }

    pub fn map_words(&self, addr: u64, words: &[u32]) {
        self.0.lock().unwrap().map_words(addr, words);
    }

    pub fn read(&self, addr: u64, len: usize) -> Option<Vec<u8>> {
        let mut buf = vec![0u8; len];
        self.0.lock().unwrap().read_user(addr, &mut buf).ok()?;
        Some(buf)
    }
}

struct SpySignals(Spy);

impl SignalSync for SpySignals {
    fn enter_no_interrupt_window(&mut self) -> usize {
        self.0.record("enter_no_interrupt_window");
        0
    }
    fn leave_no_interrupt_window(&mut self) {
        self.0.record("leave_no_interrupt_window");
    }
    fn resume_after_fork(&mut self) {
        self.0.record("resume_after_fork");
    }
    fn recompute_pending(&mut self) {
        self.0.record("recompute_pending");
    }
    fn clear_pending(&mut self) {
        self.0.record("clear_pending");
    }
}

struct SpyMemory(Spy, SharedMemory);

impl MemoryScribe for SpyMemory {
    fn acquire_user_access(&mut self) {
        self.0.record("acquire_user_access");
    }
    fn release_user_access(&mut self) {
        self.0.record("release_user_access");
    }
    fn notify_mode_changed(&mut self, mm_enabled: bool) {
        self.0.record(format!("notify_mode_changed({})", mm_enabled));
    }
    fn reset_fence_numbering(&mut self) {
        self.0.record("reset_fence_numbering");
    }
    fn enter_deterministic_data(&mut self) {
        self.0.record("enter_deterministic_data");
    }
    fn read_user(&mut self, addr: u64, buf: &mut [u8]) -> std::result::Result<(), ()> {
        (self.1).0.lock().unwrap().read_user(addr, buf)
    }
    fn write_user(&mut self, addr: u64, data: &[u8]) -> std::result::Result<(), ()> {
        (self.1).0.lock().unwrap().write_user(addr, data)
    }
}

struct SpyBookmarks(Spy);

impl Bookmarks for SpyBookmarks {
    fn bookmark_point(&mut self, point: BookmarkPoint) {
        self.0.record(format!("bookmark({:?})", point));
    }
}

fn subsystems_for(spy: &Spy, memory: &SharedMemory) -> Subsystems {
    Subsystems {
        signals: Box::new(SpySignals(spy.clone())),
        memory: Box::new(SpyMemory(spy.clone(), memory.clone())),
        bookmarks: Box::new(SpyBookmarks(spy.clone())),
    }
}

pub fn spy_subsystems() -> (Subsystems, Spy) {
    let spy = Spy::default();
    (subsystems_for(&spy, &SharedMemory::default()), spy)
}

pub struct Harness {
    pub session: SessionSharedPtr,
    pub stream: Arc<EventQueue>,
    pub unit: TracedUnit,
    pub spy: Spy,
    pub memory: SharedMemory,
}

impl Harness {
    pub const PID: libc::pid_t = 1000;

    pub fn record_flags() -> UnitFlags {
        UnitFlags::RECORD | (UnitFlags::ENABLE_ALL - UnitFlags::ENABLE_REGS)
    }

    pub fn replay_flags() -> UnitFlags {
        UnitFlags::REPLAY | (UnitFlags::ENABLE_ALL - UnitFlags::ENABLE_REGS)
    }

    pub fn recording() -> Harness {
        Harness::with_flags(Harness::record_flags(), EventQueue::new())
    }

    /// Replays `events`; the stream is sealed.
    pub fn replaying(events: Vec<Event>) -> Harness {
        Harness::with_flags(Harness::replay_flags(), EventQueue::from_events(events))
    }

    pub fn with_flags(flags: UnitFlags, stream: EventQueue) -> Harness {
        let session = Session::new();
        let stream = Arc::new(stream);
        let spy = Spy::default();
        let memory = SharedMemory::default();
        let unit = TracedUnit::new(
            Harness::PID,
            flags,
            &session,
            stream.clone(),
            subsystems_for(&spy, &memory),
        );
        Harness {
            session,
            stream,
            unit,
            spy,
            memory,
        }
    }

    pub fn enter(&mut self, nr: i32, args: &[u64]) -> Result<()> {
        self.enter_regs(&Registers::for_syscall(nr, args))
    }

    pub fn enter_regs(&mut self, regs: &Registers) -> Result<()> {
        self.unit.enter_syscall(regs)
    }

    pub fn exit(&mut self, ret: i64) {
        let mut regs = Registers::for_syscall(self.unit.current_syscall().nr, &[]);
        regs.set_syscall_result(ret);
        self.unit.exit_syscall(&regs);
    }

    /// A full syscall. A failed entry still exits, with the error as the
    /// result.
    pub fn syscall(&mut self, nr: i32, args: &[u64], ret: i64) -> Result<()> {
        match self.enter(nr, args) {
            Ok(()) => {
                self.exit(ret);
                Ok(())
            }
            Err(e) => {
                self.exit(-(e.errno() as i64));
                Err(e)
            }
        }
    }

    /// Divergence notes and mutation events published so far.
    pub fn divergences(&self) -> Vec<Event> {
        self.session.divergences().visible_events()
    }
}
