use crate::{
    error::EDIVERGE,
    kernel_abi::{
        is_futex_identity,
        is_socketcall_identity,
        syscall_nr_to_meta,
        FUTEX_FIRST,
        FUTEX_NAMES,
        NR_GET_SCRIBE_FLAGS,
        NR_SCRIBE_FILTER_SYSCALL,
        NR_SCRIBE_RECV_EVENT,
        NR_SCRIBE_SEND_EVENT,
        NR_SET_SCRIBE_FLAGS,
        SOCKETCALL_FIRST,
        SOCKETCALL_NAMES,
    },
};

/// Name of a scribe syscall identity. Expanded multiplexer identities get
/// the name of their sub-operation.
pub fn syscall_name(nr: i32) -> String {
    if is_socketcall_identity(nr) {
        return SOCKETCALL_NAMES[(nr - SOCKETCALL_FIRST) as usize].into();
    }
    if is_futex_identity(nr) {
        return FUTEX_NAMES[(nr - FUTEX_FIRST) as usize].into();
    }

    match nr {
        NR_GET_SCRIBE_FLAGS => return "get_scribe_flags".into(),
        NR_SET_SCRIBE_FLAGS => return "set_scribe_flags".into(),
        NR_SCRIBE_SEND_EVENT => return "scribe_send_event".into(),
        NR_SCRIBE_RECV_EVENT => return "scribe_recv_event".into(),
        NR_SCRIBE_FILTER_SYSCALL => return "scribe_filter_syscall".into(),
        _ => (),
    }

    match syscall_nr_to_meta(nr) {
        Some(meta) => meta.name.into(),
        None => format!("syscall({})", nr),
    }
}

macro_rules! case {
    ($match_var:expr, $($case_name:ident),+) => {{
        match $match_var {
            $(libc::$case_name => return stringify!($case_name).into(),)+
            _ => ()
        }
    }};
}

pub fn errno_name(err: i32) -> String {
    if err == 0 {
        return "SUCCESS".into();
    }
    if err == EDIVERGE {
        return "EDIVERGE".into();
    }

    case!(
        err, EPERM, ENOENT, ESRCH, EINTR, EIO, ENXIO, E2BIG, ENOEXEC, EBADF, ECHILD, EAGAIN,
        ENOMEM, EACCES, EFAULT, ENOTBLK, EBUSY, EEXIST, EXDEV, ENODEV, ENOTDIR, EISDIR, EINVAL,
        ENFILE, EMFILE, ENOTTY, ETXTBSY, EFBIG, ENOSPC, ESPIPE, EROFS, EMLINK, EPIPE, EDOM,
        ERANGE, EDEADLK, ENAMETOOLONG, ENOLCK, ENOSYS, ENOTEMPTY, ELOOP, ENOMSG, EIDRM, ENODATA,
        ETIME, EPROTO, EBADMSG, EOVERFLOW, EBADFD, EILSEQ, ERESTART, ENOTSOCK, EMSGSIZE,
        EOPNOTSUPP, EADDRINUSE, ECONNRESET, ENOBUFS, ENOTCONN, ETIMEDOUT, ECONNREFUSED,
        EALREADY, EINPROGRESS, ECANCELED
    );

    format!("errno({})", err)
}
