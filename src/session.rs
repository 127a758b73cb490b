use crate::{
    error::ScribeError,
    log::LogLevel::{LogDebug, LogError},
    trace::{event_queue::EventQueue, event_stream::EventStream},
    unit::{
        unit_flags::{SharedFlags, UnitFlags},
        UnitSharedPtr,
        UnitSharedWeakPtr,
    },
};
use libc::pid_t;
use std::{
    collections::{HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicI32, Ordering},
        Arc,
        Mutex,
        MutexGuard,
    },
};

pub type SessionSharedPtr = Arc<Session>;

struct RegisteredUnit {
    unit: UnitSharedWeakPtr,
    flags: SharedFlags,
}

/// State shared by every unit of one recording or replay.
pub struct Session {
    killed: AtomicBool,
    kill_errno: AtomicI32,
    detaching: Mutex<HashSet<pid_t>>,
    units: Mutex<HashMap<pid_t, RegisteredUnit>>,
    /// Divergence notes and everything recorded while a unit mutates.
    divergences: Arc<EventQueue>,
}

impl Session {
    pub fn new() -> SessionSharedPtr {
        Arc::new(Session {
            killed: AtomicBool::new(false),
            kill_errno: AtomicI32::new(0),
            detaching: Mutex::new(HashSet::new()),
            units: Mutex::new(HashMap::new()),
            divergences: Arc::new(EventQueue::new()),
        })
    }

    /// Fatal for every unit of the session. Only the first cause is kept.
    pub fn kill(&self, cause: &ScribeError) {
        if self.killed.swap(true, Ordering::SeqCst) {
            return;
        }
        self.kill_errno.store(cause.errno(), Ordering::SeqCst);
        log!(LogError, "killing session: {}", cause);
        self.divergences.seal();
    }

    pub fn is_killed(&self) -> bool {
        self.killed.load(Ordering::SeqCst)
    }

    pub fn kill_errno(&self) -> Option<i32> {
        if self.is_killed() {
            Some(self.kill_errno.load(Ordering::SeqCst))
        } else {
            None
        }
    }

    /// Ask for `pid` to be detached at its next syscall boundary.
    pub fn request_detach(&self, pid: pid_t) {
        log!(LogDebug, "detach requested for {}", pid);
        lock(&self.detaching).insert(pid);
    }

    pub fn is_detaching(&self, pid: pid_t) -> bool {
        lock(&self.detaching).contains(&pid)
    }

    pub fn detach_done(&self, pid: pid_t) {
        lock(&self.detaching).remove(&pid);
    }

    pub fn register_unit(&self, pid: pid_t, unit: &UnitSharedPtr, flags: SharedFlags) {
        lock(&self.units).insert(
            pid,
            RegisteredUnit {
                unit: Arc::downgrade(unit),
                flags,
            },
        );
    }

    pub fn unregister_unit(&self, pid: pid_t) {
        lock(&self.units).remove(&pid);
    }

    /// The unit with that pid, if it is still alive.
    pub fn unit(&self, pid: pid_t) -> Option<UnitSharedPtr> {
        lock(&self.units).get(&pid).and_then(|r| r.unit.upgrade())
    }

    /// Current flags of a live unit. Never waits on the unit itself, which
    /// may be blocked inside a syscall.
    pub fn unit_flags(&self, pid: pid_t) -> Option<UnitFlags> {
        lock(&self.units)
            .get(&pid)
            .filter(|r| r.unit.strong_count() > 0)
            .map(|r| r.flags.get())
    }

    pub fn divergences(&self) -> &Arc<EventQueue> {
        &self.divergences
    }

    pub fn divergence_stream(&self) -> Arc<dyn EventStream> {
        self.divergences.clone()
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}
