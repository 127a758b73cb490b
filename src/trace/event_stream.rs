use crate::{
    error::{RequestError, ScribeError},
    event::{Event, EventType},
};

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum WaitMode {
    NoWait,
    /// Block until an event is visible or the stream is sealed.
    Wait,
    /// Like `Wait`, but an `interrupt()` on the stream aborts the wait.
    WaitInterruptible,
}

/// Placeholder for an event whose contents are decided later. Consumers
/// can't see past an uncommitted slot.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct SlotHandle(pub(super) u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StreamError {
    /// Nothing to consume and nothing more will arrive.
    Empty,
    Interrupted,
    /// The stream refused to allocate another event.
    Full,
    /// The slot was never reserved on this stream, or was already committed.
    BadSlot,
    /// `dequeue_expecting` found an event of another type at the head.
    Unexpected(EventType),
}

/// Ordered per-unit queue of events, shared between a producer and a
/// consumer.
pub trait EventStream: Send + Sync {
    fn enqueue(&self, event: Event) -> Result<(), StreamError>;

    fn reserve_slot(&self) -> SlotHandle;

    fn fill_slot(&self, slot: SlotHandle, event: Event) -> Result<(), StreamError>;

    /// Make a filled slot visible to consumers. Committing a slot that was
    /// never filled removes it.
    fn commit_slot(&self, slot: SlotHandle) -> Result<(), StreamError>;

    fn peek(&self, mode: WaitMode) -> Result<Event, StreamError>;

    fn dequeue(&self, mode: WaitMode) -> Result<Event, StreamError>;

    /// Consume the head of the stream only if it has type `ty`. Waits for
    /// the head to become visible.
    fn dequeue_expecting(&self, ty: EventType) -> Result<Event, StreamError> {
        let head = self.peek(WaitMode::Wait)?;
        if head.event_type() != ty {
            return Err(StreamError::Unexpected(head.event_type()));
        }
        self.dequeue(WaitMode::NoWait)
    }
}

impl From<StreamError> for ScribeError {
    fn from(e: StreamError) -> Self {
        match e {
            StreamError::Empty => ScribeError::InvalidRequest(RequestError::EndOfStream),
            StreamError::Interrupted => ScribeError::Interrupted,
            StreamError::Full => ScribeError::ResourceExhaustion,
            StreamError::BadSlot => ScribeError::ProtocolViolation("bad stream slot".into()),
            StreamError::Unexpected(ty) => {
                ScribeError::ProtocolViolation(format!("unexpected {} event", ty))
            }
        }
    }
}
