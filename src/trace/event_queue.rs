use super::event_stream::{EventStream, SlotHandle, StreamError, WaitMode};
use crate::event::Event;
use std::{
    collections::VecDeque,
    sync::{Condvar, Mutex, MutexGuard},
};

enum Entry {
    Ready(Event),
    Slot { id: u64, event: Option<Event> },
}

struct QueueInner {
    entries: VecDeque<Entry>,
    next_slot: u64,
    sealed: bool,
    interrupt_pending: bool,
}

impl QueueInner {
    fn head_visible(&self) -> bool {
        match self.entries.front() {
            Some(Entry::Ready(_)) => true,
            _ => false,
        }
    }

    fn slot_index(&self, slot: SlotHandle) -> Option<usize> {
        self.entries.iter().position(|e| match e {
            Entry::Slot { id, .. } => *id == slot.0,
            Entry::Ready(_) => false,
        })
    }
}

/// In-memory event stream. Producers and consumers may live on different
/// threads; blocking waits park on a condition variable.
pub struct EventQueue {
    inner: Mutex<QueueInner>,
    cond: Condvar,
    capacity: Option<usize>,
}

impl Default for EventQueue {
    fn default() -> Self {
        EventQueue::new()
    }
}

impl EventQueue {
    pub fn new() -> EventQueue {
        EventQueue::with_capacity(None)
    }

    /// A queue that refuses to hold more than `capacity` events.
    pub fn with_capacity(capacity: Option<usize>) -> EventQueue {
        EventQueue {
            inner: Mutex::new(QueueInner {
                entries: VecDeque::new(),
                next_slot: 0,
                sealed: false,
                interrupt_pending: false,
            }),
            cond: Condvar::new(),
            capacity,
        }
    }

    /// A sealed queue holding `events`, as handed to a replaying unit.
    pub fn from_events<I: IntoIterator<Item = Event>>(events: I) -> EventQueue {
        let q = EventQueue::new();
        {
            let mut inner = q.lock();
            inner.entries.extend(events.into_iter().map(Entry::Ready));
            inner.sealed = true;
        }
        q
    }

    fn lock(&self) -> MutexGuard<'_, QueueInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// No more events will be produced. Waits on an empty sealed queue fail
    /// with `Empty` instead of blocking.
    pub fn seal(&self) {
        self.lock().sealed = true;
        self.cond.notify_all();
    }

    pub fn is_sealed(&self) -> bool {
        self.lock().sealed
    }

    /// Abort the next (or current) interruptible wait.
    pub fn interrupt(&self) {
        self.lock().interrupt_pending = true;
        self.cond.notify_all();
    }

    /// Number of entries, reserved slots included.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Events currently visible to a consumer, in order, without consuming
    /// them.
    pub fn visible_events(&self) -> Vec<Event> {
        let inner = self.lock();
        let mut out = Vec::new();
        for e in inner.entries.iter() {
            match e {
                Entry::Ready(ev) => out.push(ev.clone()),
                Entry::Slot { .. } => break,
            }
        }
        out
    }

    /// Remove every visible event. Returns them along with the number of
    /// entries left behind an uncommitted slot.
    pub fn drain(&self) -> (Vec<Event>, usize) {
        let mut inner = self.lock();
        let mut out = Vec::new();
        while inner.head_visible() {
            if let Some(Entry::Ready(ev)) = inner.entries.pop_front() {
                out.push(ev);
            }
        }
        let left = inner.entries.len();
        (out, left)
    }

    fn wait_for_head(&self, mode: WaitMode) -> Result<MutexGuard<'_, QueueInner>, StreamError> {
        let mut inner = self.lock();
        loop {
            if inner.head_visible() {
                return Ok(inner);
            }
            if mode == WaitMode::NoWait {
                return Err(StreamError::Empty);
            }
            if mode == WaitMode::WaitInterruptible && inner.interrupt_pending {
                inner.interrupt_pending = false;
                return Err(StreamError::Interrupted);
            }
            // A sealed queue can still gain visible events when a pending
            // slot is committed.
            if inner.sealed && inner.entries.is_empty() {
                return Err(StreamError::Empty);
            }
            inner = self.cond.wait(inner).unwrap_or_else(|e| e.into_inner());
        }
    }
}

impl EventStream for EventQueue {
    fn enqueue(&self, event: Event) -> Result<(), StreamError> {
        let mut inner = self.lock();
        if let Some(cap) = self.capacity {
            if inner.entries.len() >= cap {
                return Err(StreamError::Full);
            }
        }
        inner.entries.push_back(Entry::Ready(event));
        drop(inner);
        self.cond.notify_all();
        Ok(())
    }

    fn reserve_slot(&self) -> SlotHandle {
        let mut inner = self.lock();
        let id = inner.next_slot;
        inner.next_slot += 1;
        inner.entries.push_back(Entry::Slot { id, event: None });
        SlotHandle(id)
    }

    fn fill_slot(&self, slot: SlotHandle, event: Event) -> Result<(), StreamError> {
        let mut inner = self.lock();
        let i = inner.slot_index(slot).ok_or(StreamError::BadSlot)?;
        if let Some(Entry::Slot { event: e, .. }) = inner.entries.get_mut(i) {
            *e = Some(event);
        }
        Ok(())
    }

    fn commit_slot(&self, slot: SlotHandle) -> Result<(), StreamError> {
        let mut inner = self.lock();
        let i = inner.slot_index(slot).ok_or(StreamError::BadSlot)?;
        let filled = match inner.entries.get_mut(i) {
            Some(Entry::Slot { event, .. }) => event.take(),
            _ => None,
        };
        match filled {
            Some(ev) => inner.entries[i] = Entry::Ready(ev),
            None => {
                inner.entries.remove(i);
            }
        }
        drop(inner);
        self.cond.notify_all();
        Ok(())
    }

    fn peek(&self, mode: WaitMode) -> Result<Event, StreamError> {
        let inner = self.wait_for_head(mode)?;
        match inner.entries.front() {
            Some(Entry::Ready(ev)) => Ok(ev.clone()),
            _ => Err(StreamError::Empty),
        }
    }

    fn dequeue(&self, mode: WaitMode) -> Result<Event, StreamError> {
        let mut inner = self.wait_for_head(mode)?;
        match inner.entries.pop_front() {
            Some(Entry::Ready(ev)) => Ok(ev),
            _ => Err(StreamError::Empty),
        }
    }
}
