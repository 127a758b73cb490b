use crate::kernel_metadata::syscall_name;
use nix::errno::Errno;
use thiserror::Error;

/// Private errno reported to the caller of a syscall that diverged from the
/// recorded trace under strict replay.
pub const EDIVERGE: i32 = 200;

pub type Result<T> = std::result::Result<T, ScribeError>;

#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum ScribeError {
    /// The live execution disagrees with the recorded trace.
    #[error("divergence in {}: {}", name_of(.nr), .detail)]
    Divergence { nr: i32, detail: String },
    /// An event could not be allocated. Always kills the whole session.
    #[error("could not allocate an event")]
    ResourceExhaustion,
    /// The recorded stream had an event of the wrong shape or in the wrong
    /// place. Handled exactly like a divergence.
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
    #[error("invalid request: {0}")]
    InvalidRequest(#[from] RequestError),
    /// A blocking receive was aborted by a pending signal.
    #[error("interrupted")]
    Interrupted,
}

/// Misuse of one of the control-surface operations.
#[derive(Error, Clone, Debug, Eq, PartialEq)]
pub enum RequestError {
    #[error("unit is not scribed")]
    NotScribed,
    #[error("cannot filter the syscalls of an unscribed unit")]
    FilterUnscribed,
    #[error("unit is not recording")]
    NotRecording,
    #[error("unit is not replaying")]
    NotReplaying,
    #[error("no unit with pid {0}")]
    NoSuchUnit(libc::pid_t),
    #[error("setting the flags of another unit is not supported")]
    RemoteSetUnsupported,
    #[error("syscall identity {0} is outside the scribe universe")]
    UnknownSyscall(i32),
    #[error("unknown event type {0}")]
    UnknownEventType(u8),
    #[error("malformed event: {0}")]
    MalformedEvent(&'static str),
    #[error("buffer of {available} bytes cannot hold {needed} bytes")]
    BufferTooSmall { needed: usize, available: usize },
    #[error("bad user buffer")]
    BadBuffer,
    #[error("end of event stream")]
    EndOfStream,
}

fn name_of(nr: &i32) -> String {
    syscall_name(*nr)
}

impl ScribeError {
    pub fn divergence<S: Into<String>>(nr: i32, detail: S) -> ScribeError {
        ScribeError::Divergence {
            nr,
            detail: detail.into(),
        }
    }

    pub fn is_divergence(&self) -> bool {
        match self {
            ScribeError::Divergence { .. } | ScribeError::ProtocolViolation(_) => true,
            _ => false,
        }
    }

    /// Kernel-style error number handed back to the traced unit.
    pub fn errno(&self) -> i32 {
        match self {
            ScribeError::Divergence { .. } | ScribeError::ProtocolViolation(_) => EDIVERGE,
            ScribeError::ResourceExhaustion => Errno::ENOMEM as i32,
            ScribeError::Interrupted => Errno::EINTR as i32,
            ScribeError::InvalidRequest(e) => e.errno(),
        }
    }
}

impl RequestError {
    pub fn errno(&self) -> i32 {
        let errno = match self {
            RequestError::NotScribed => Errno::EINVAL,
            RequestError::FilterUnscribed
            | RequestError::NotRecording
            | RequestError::NotReplaying => Errno::EPERM,
            RequestError::NoSuchUnit(_) => Errno::ESRCH,
            RequestError::RemoteSetUnsupported => Errno::EINVAL,
            RequestError::UnknownSyscall(_) => Errno::EINVAL,
            RequestError::UnknownEventType(_) | RequestError::MalformedEvent(_) => Errno::EINVAL,
            RequestError::BufferTooSmall { .. } => Errno::EAGAIN,
            RequestError::BadBuffer => Errno::EFAULT,
            RequestError::EndOfStream => Errno::ENODATA,
        };
        errno as i32
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::kernel_abi::x86;

    #[test]
    fn errno_mapping() {
        assert_eq!(ScribeError::divergence(x86::OPEN, "args").errno(), EDIVERGE);
        assert_eq!(ScribeError::ResourceExhaustion.errno(), libc::ENOMEM);
        assert_eq!(ScribeError::Interrupted.errno(), libc::EINTR);
        assert_eq!(
            ScribeError::from(RequestError::NoSuchUnit(42)).errno(),
            libc::ESRCH
        );
        assert_eq!(
            ScribeError::from(RequestError::BufferTooSmall {
                needed: 9,
                available: 1
            })
            .errno(),
            libc::EAGAIN
        );
    }

    #[test]
    fn protocol_violation_is_a_divergence() {
        assert!(ScribeError::ProtocolViolation("x".into()).is_divergence());
        assert!(!ScribeError::Interrupted.is_divergence());
    }

    #[test]
    fn display_names_the_syscall() {
        let e = ScribeError::divergence(x86::OPEN, "argument 1 differs");
        assert_eq!(e.to_string(), "divergence in open: argument 1 differs");
    }
}
