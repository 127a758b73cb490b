//! The 32-bit x86 syscall ABI, which is the one the engine scribes.
//!
//! Identities below `NR_SYSCALLS` are the raw kernel numbers. Above them come
//! the control-surface syscalls and then the identities synthesized by
//! expanding the socket and futex multiplexers.

pub mod x86 {
    pub const EXIT: i32 = 1;
    pub const FORK: i32 = 2;
    pub const OPEN: i32 = 5;
    pub const SOCKETCALL: i32 = 102;
    pub const CLONE: i32 = 120;
    pub const PRCTL: i32 = 172;
    pub const VFORK: i32 = 190;
    pub const FUTEX: i32 = 240;
    pub const EXIT_GROUP: i32 = 252;

    /// Only matters for the `open` argument truncation.
    pub const O_CREAT: u64 = 0o100;

    pub const FUTEX_PRIVATE_FLAG: u64 = 128;
    pub const FUTEX_CLOCK_REALTIME: u64 = 256;
    pub const FUTEX_CMD_MASK: u64 = !(FUTEX_PRIVATE_FLAG | FUTEX_CLOCK_REALTIME);
    /// FUTEX_CMP_REQUEUE_PI
    pub const FUTEX_LAST_CMD: u64 = 12;

    /// SYS_RECVMMSG
    pub const SYS_SOCKETCALL_LAST: u64 = 19;

    /// Size of a `long` in the traced unit.
    pub const WORD_SIZE: usize = 4;
}

/// Number of raw syscalls described by `SYSCALL_TABLE`.
pub const NR_SYSCALLS: i32 = 338;

pub const NR_GET_SCRIBE_FLAGS: i32 = 338;
pub const NR_SET_SCRIBE_FLAGS: i32 = 339;
pub const NR_SCRIBE_SEND_EVENT: i32 = 340;
pub const NR_SCRIBE_RECV_EVENT: i32 = 341;
pub const NR_SCRIBE_FILTER_SYSCALL: i32 = 342;

pub const SOCKETCALL_FIRST: i32 = 343;
pub const SOCKETCALL_LAST: i32 = SOCKETCALL_FIRST + x86::SYS_SOCKETCALL_LAST as i32;
pub const FUTEX_FIRST: i32 = SOCKETCALL_LAST + 1;
pub const FUTEX_LAST: i32 = FUTEX_FIRST + x86::FUTEX_LAST_CMD as i32;

/// Size of the fixed identity universe, i.e. of the per-unit filter bitmap.
pub const NR_SCRIBE_SYSCALLS: usize = FUTEX_LAST as usize + 1;

const_assert!(SOCKETCALL_FIRST == NR_SCRIBE_FILTER_SYSCALL + 1);
const_assert!(NR_SCRIBE_SYSCALLS == 376);

/// Argument counts of the socket multiplexer's sub-operations.
pub const SOCKET_NARGS: [u8; 20] = [0, 3, 3, 3, 2, 3, 3, 3, 4, 4, 4, 6, 6, 2, 5, 5, 3, 3, 4, 5];

pub const SOCKETCALL_NAMES: [&str; 20] = [
    "socketcall(0)",
    "socket",
    "bind",
    "connect",
    "listen",
    "accept",
    "getsockname",
    "getpeername",
    "socketpair",
    "send",
    "recv",
    "sendto",
    "recvfrom",
    "shutdown",
    "setsockopt",
    "getsockopt",
    "sendmsg",
    "recvmsg",
    "accept4",
    "recvmmsg",
];

pub const FUTEX_NAMES: [&str; 13] = [
    "futex_wait",
    "futex_wake",
    "futex_fd",
    "futex_requeue",
    "futex_cmp_requeue",
    "futex_wake_op",
    "futex_lock_pi",
    "futex_unlock_pi",
    "futex_trylock_pi",
    "futex_wait_bitset",
    "futex_wake_bitset",
    "futex_wait_requeue_pi",
    "futex_cmp_requeue_pi",
];

#[derive(Copy, Clone, Debug)]
pub struct SyscallMeta {
    pub name: &'static str,
    pub nb_args: u8,
}

/// Obsolete or never implemented numbers carry no metadata.
pub fn syscall_nr_to_meta(nr: i32) -> Option<&'static SyscallMeta> {
    if nr < 0 || nr >= NR_SYSCALLS {
        return None;
    }
    SYSCALL_TABLE[nr as usize].as_ref()
}

pub fn is_socketcall_identity(nr: i32) -> bool {
    SOCKETCALL_FIRST <= nr && nr <= SOCKETCALL_LAST
}

pub fn is_futex_identity(nr: i32) -> bool {
    FUTEX_FIRST <= nr && nr <= FUTEX_LAST
}

pub fn is_process_creation_syscall(nr: i32) -> bool {
    nr == x86::CLONE || nr == x86::FORK || nr == x86::VFORK
}

pub fn is_exit_syscall(nr: i32) -> bool {
    nr == x86::EXIT || nr == x86::EXIT_GROUP
}

static SYSCALL_TABLE: [Option<SyscallMeta>; NR_SYSCALLS as usize] = [
    Some(SyscallMeta { name: "restart_syscall", nb_args: 0 }),
    Some(SyscallMeta { name: "exit", nb_args: 1 }),
    Some(SyscallMeta { name: "fork", nb_args: 0 }),
    Some(SyscallMeta { name: "read", nb_args: 3 }),
    Some(SyscallMeta { name: "write", nb_args: 3 }),
    Some(SyscallMeta { name: "open", nb_args: 3 }),
    Some(SyscallMeta { name: "close", nb_args: 1 }),
    Some(SyscallMeta { name: "waitpid", nb_args: 3 }),
    Some(SyscallMeta { name: "creat", nb_args: 2 }),
    Some(SyscallMeta { name: "link", nb_args: 2 }),
    Some(SyscallMeta { name: "unlink", nb_args: 1 }),
    Some(SyscallMeta { name: "execve", nb_args: 3 }),
    Some(SyscallMeta { name: "chdir", nb_args: 1 }),
    Some(SyscallMeta { name: "time", nb_args: 1 }),
    Some(SyscallMeta { name: "mknod", nb_args: 3 }),
    Some(SyscallMeta { name: "chmod", nb_args: 2 }),
    Some(SyscallMeta { name: "lchown", nb_args: 3 }),
    None,
    Some(SyscallMeta { name: "oldstat", nb_args: 2 }),
    Some(SyscallMeta { name: "lseek", nb_args: 3 }),
    Some(SyscallMeta { name: "getpid", nb_args: 0 }),
    Some(SyscallMeta { name: "mount", nb_args: 5 }),
    Some(SyscallMeta { name: "umount", nb_args: 1 }),
    Some(SyscallMeta { name: "setuid", nb_args: 1 }),
    Some(SyscallMeta { name: "getuid", nb_args: 0 }),
    Some(SyscallMeta { name: "stime", nb_args: 1 }),
    Some(SyscallMeta { name: "ptrace", nb_args: 4 }),
    Some(SyscallMeta { name: "alarm", nb_args: 1 }),
    Some(SyscallMeta { name: "oldfstat", nb_args: 2 }),
    Some(SyscallMeta { name: "pause", nb_args: 0 }),
    Some(SyscallMeta { name: "utime", nb_args: 2 }),
    None,
    None,
    Some(SyscallMeta { name: "access", nb_args: 2 }),
    Some(SyscallMeta { name: "nice", nb_args: 1 }),
    None,
    Some(SyscallMeta { name: "sync", nb_args: 0 }),
    Some(SyscallMeta { name: "kill", nb_args: 2 }),
    Some(SyscallMeta { name: "rename", nb_args: 2 }),
    Some(SyscallMeta { name: "mkdir", nb_args: 2 }),
    Some(SyscallMeta { name: "rmdir", nb_args: 1 }),
    Some(SyscallMeta { name: "dup", nb_args: 1 }),
    Some(SyscallMeta { name: "pipe", nb_args: 1 }),
    Some(SyscallMeta { name: "times", nb_args: 1 }),
    None,
    Some(SyscallMeta { name: "brk", nb_args: 1 }),
    Some(SyscallMeta { name: "setgid", nb_args: 1 }),
    Some(SyscallMeta { name: "getgid", nb_args: 0 }),
    Some(SyscallMeta { name: "signal", nb_args: 2 }),
    Some(SyscallMeta { name: "geteuid", nb_args: 0 }),
    Some(SyscallMeta { name: "getegid", nb_args: 0 }),
    Some(SyscallMeta { name: "acct", nb_args: 1 }),
    Some(SyscallMeta { name: "umount2", nb_args: 2 }),
    None,
    Some(SyscallMeta { name: "ioctl", nb_args: 3 }),
    Some(SyscallMeta { name: "fcntl", nb_args: 3 }),
    None,
    Some(SyscallMeta { name: "setpgid", nb_args: 2 }),
    None,
    Some(SyscallMeta { name: "oldolduname", nb_args: 1 }),
    Some(SyscallMeta { name: "umask", nb_args: 1 }),
    Some(SyscallMeta { name: "chroot", nb_args: 1 }),
    Some(SyscallMeta { name: "ustat", nb_args: 2 }),
    Some(SyscallMeta { name: "dup2", nb_args: 2 }),
    Some(SyscallMeta { name: "getppid", nb_args: 0 }),
    Some(SyscallMeta { name: "getpgrp", nb_args: 0 }),
    Some(SyscallMeta { name: "setsid", nb_args: 0 }),
    Some(SyscallMeta { name: "sigaction", nb_args: 3 }),
    Some(SyscallMeta { name: "sgetmask", nb_args: 0 }),
    Some(SyscallMeta { name: "ssetmask", nb_args: 1 }),
    Some(SyscallMeta { name: "setreuid", nb_args: 2 }),
    Some(SyscallMeta { name: "setregid", nb_args: 2 }),
    Some(SyscallMeta { name: "sigsuspend", nb_args: 3 }),
    Some(SyscallMeta { name: "sigpending", nb_args: 1 }),
    Some(SyscallMeta { name: "sethostname", nb_args: 2 }),
    Some(SyscallMeta { name: "setrlimit", nb_args: 2 }),
    Some(SyscallMeta { name: "getrlimit", nb_args: 2 }),
    Some(SyscallMeta { name: "getrusage", nb_args: 2 }),
    Some(SyscallMeta { name: "gettimeofday", nb_args: 2 }),
    Some(SyscallMeta { name: "settimeofday", nb_args: 2 }),
    Some(SyscallMeta { name: "getgroups", nb_args: 2 }),
    Some(SyscallMeta { name: "setgroups", nb_args: 2 }),
    Some(SyscallMeta { name: "select", nb_args: 1 }),
    Some(SyscallMeta { name: "symlink", nb_args: 2 }),
    Some(SyscallMeta { name: "oldlstat", nb_args: 2 }),
    Some(SyscallMeta { name: "readlink", nb_args: 3 }),
    Some(SyscallMeta { name: "uselib", nb_args: 1 }),
    Some(SyscallMeta { name: "swapon", nb_args: 2 }),
    Some(SyscallMeta { name: "reboot", nb_args: 4 }),
    Some(SyscallMeta { name: "readdir", nb_args: 3 }),
    Some(SyscallMeta { name: "mmap", nb_args: 1 }),
    Some(SyscallMeta { name: "munmap", nb_args: 2 }),
    Some(SyscallMeta { name: "truncate", nb_args: 2 }),
    Some(SyscallMeta { name: "ftruncate", nb_args: 2 }),
    Some(SyscallMeta { name: "fchmod", nb_args: 2 }),
    Some(SyscallMeta { name: "fchown", nb_args: 3 }),
    Some(SyscallMeta { name: "getpriority", nb_args: 2 }),
    Some(SyscallMeta { name: "setpriority", nb_args: 3 }),
    None,
    Some(SyscallMeta { name: "statfs", nb_args: 2 }),
    Some(SyscallMeta { name: "fstatfs", nb_args: 2 }),
    Some(SyscallMeta { name: "ioperm", nb_args: 3 }),
    Some(SyscallMeta { name: "socketcall", nb_args: 2 }),
    Some(SyscallMeta { name: "syslog", nb_args: 3 }),
    Some(SyscallMeta { name: "setitimer", nb_args: 3 }),
    Some(SyscallMeta { name: "getitimer", nb_args: 2 }),
    Some(SyscallMeta { name: "stat", nb_args: 2 }),
    Some(SyscallMeta { name: "lstat", nb_args: 2 }),
    Some(SyscallMeta { name: "fstat", nb_args: 2 }),
    Some(SyscallMeta { name: "olduname", nb_args: 1 }),
    Some(SyscallMeta { name: "iopl", nb_args: 1 }),
    Some(SyscallMeta { name: "vhangup", nb_args: 0 }),
    None,
    Some(SyscallMeta { name: "vm86old", nb_args: 1 }),
    Some(SyscallMeta { name: "wait4", nb_args: 4 }),
    Some(SyscallMeta { name: "swapoff", nb_args: 1 }),
    Some(SyscallMeta { name: "sysinfo", nb_args: 1 }),
    Some(SyscallMeta { name: "ipc", nb_args: 6 }),
    Some(SyscallMeta { name: "fsync", nb_args: 1 }),
    Some(SyscallMeta { name: "sigreturn", nb_args: 0 }),
    Some(SyscallMeta { name: "clone", nb_args: 5 }),
    Some(SyscallMeta { name: "setdomainname", nb_args: 2 }),
    Some(SyscallMeta { name: "uname", nb_args: 1 }),
    Some(SyscallMeta { name: "modify_ldt", nb_args: 3 }),
    Some(SyscallMeta { name: "adjtimex", nb_args: 1 }),
    Some(SyscallMeta { name: "mprotect", nb_args: 3 }),
    Some(SyscallMeta { name: "sigprocmask", nb_args: 3 }),
    None,
    Some(SyscallMeta { name: "init_module", nb_args: 3 }),
    Some(SyscallMeta { name: "delete_module", nb_args: 2 }),
    None,
    Some(SyscallMeta { name: "quotactl", nb_args: 4 }),
    Some(SyscallMeta { name: "getpgid", nb_args: 1 }),
    Some(SyscallMeta { name: "fchdir", nb_args: 1 }),
    Some(SyscallMeta { name: "bdflush", nb_args: 2 }),
    Some(SyscallMeta { name: "sysfs", nb_args: 3 }),
    Some(SyscallMeta { name: "personality", nb_args: 1 }),
    None,
    Some(SyscallMeta { name: "setfsuid", nb_args: 1 }),
    Some(SyscallMeta { name: "setfsgid", nb_args: 1 }),
    Some(SyscallMeta { name: "_llseek", nb_args: 5 }),
    Some(SyscallMeta { name: "getdents", nb_args: 3 }),
    Some(SyscallMeta { name: "_newselect", nb_args: 5 }),
    Some(SyscallMeta { name: "flock", nb_args: 2 }),
    Some(SyscallMeta { name: "msync", nb_args: 3 }),
    Some(SyscallMeta { name: "readv", nb_args: 3 }),
    Some(SyscallMeta { name: "writev", nb_args: 3 }),
    Some(SyscallMeta { name: "getsid", nb_args: 1 }),
    Some(SyscallMeta { name: "fdatasync", nb_args: 1 }),
    Some(SyscallMeta { name: "_sysctl", nb_args: 1 }),
    Some(SyscallMeta { name: "mlock", nb_args: 2 }),
    Some(SyscallMeta { name: "munlock", nb_args: 2 }),
    Some(SyscallMeta { name: "mlockall", nb_args: 1 }),
    Some(SyscallMeta { name: "munlockall", nb_args: 0 }),
    Some(SyscallMeta { name: "sched_setparam", nb_args: 2 }),
    Some(SyscallMeta { name: "sched_getparam", nb_args: 2 }),
    Some(SyscallMeta { name: "sched_setscheduler", nb_args: 3 }),
    Some(SyscallMeta { name: "sched_getscheduler", nb_args: 1 }),
    Some(SyscallMeta { name: "sched_yield", nb_args: 0 }),
    Some(SyscallMeta { name: "sched_get_priority_max", nb_args: 1 }),
    Some(SyscallMeta { name: "sched_get_priority_min", nb_args: 1 }),
    Some(SyscallMeta { name: "sched_rr_get_interval", nb_args: 2 }),
    Some(SyscallMeta { name: "nanosleep", nb_args: 2 }),
    Some(SyscallMeta { name: "mremap", nb_args: 5 }),
    Some(SyscallMeta { name: "setresuid", nb_args: 3 }),
    Some(SyscallMeta { name: "getresuid", nb_args: 3 }),
    Some(SyscallMeta { name: "vm86", nb_args: 2 }),
    None,
    Some(SyscallMeta { name: "poll", nb_args: 3 }),
    Some(SyscallMeta { name: "nfsservctl", nb_args: 3 }),
    Some(SyscallMeta { name: "setresgid", nb_args: 3 }),
    Some(SyscallMeta { name: "getresgid", nb_args: 3 }),
    Some(SyscallMeta { name: "prctl", nb_args: 5 }),
    Some(SyscallMeta { name: "rt_sigreturn", nb_args: 0 }),
    Some(SyscallMeta { name: "rt_sigaction", nb_args: 4 }),
    Some(SyscallMeta { name: "rt_sigprocmask", nb_args: 4 }),
    Some(SyscallMeta { name: "rt_sigpending", nb_args: 2 }),
    Some(SyscallMeta { name: "rt_sigtimedwait", nb_args: 4 }),
    Some(SyscallMeta { name: "rt_sigqueueinfo", nb_args: 3 }),
    Some(SyscallMeta { name: "rt_sigsuspend", nb_args: 2 }),
    Some(SyscallMeta { name: "pread64", nb_args: 4 }),
    Some(SyscallMeta { name: "pwrite64", nb_args: 4 }),
    Some(SyscallMeta { name: "chown", nb_args: 3 }),
    Some(SyscallMeta { name: "getcwd", nb_args: 2 }),
    Some(SyscallMeta { name: "capget", nb_args: 2 }),
    Some(SyscallMeta { name: "capset", nb_args: 2 }),
    Some(SyscallMeta { name: "sigaltstack", nb_args: 2 }),
    Some(SyscallMeta { name: "sendfile", nb_args: 4 }),
    None,
    None,
    Some(SyscallMeta { name: "vfork", nb_args: 0 }),
    Some(SyscallMeta { name: "ugetrlimit", nb_args: 2 }),
    Some(SyscallMeta { name: "mmap2", nb_args: 6 }),
    Some(SyscallMeta { name: "truncate64", nb_args: 2 }),
    Some(SyscallMeta { name: "ftruncate64", nb_args: 2 }),
    Some(SyscallMeta { name: "stat64", nb_args: 2 }),
    Some(SyscallMeta { name: "lstat64", nb_args: 2 }),
    Some(SyscallMeta { name: "fstat64", nb_args: 2 }),
    Some(SyscallMeta { name: "lchown32", nb_args: 3 }),
    Some(SyscallMeta { name: "getuid32", nb_args: 0 }),
    Some(SyscallMeta { name: "getgid32", nb_args: 0 }),
    Some(SyscallMeta { name: "geteuid32", nb_args: 0 }),
    Some(SyscallMeta { name: "getegid32", nb_args: 0 }),
    Some(SyscallMeta { name: "setreuid32", nb_args: 2 }),
    Some(SyscallMeta { name: "setregid32", nb_args: 2 }),
    Some(SyscallMeta { name: "getgroups32", nb_args: 2 }),
    Some(SyscallMeta { name: "setgroups32", nb_args: 2 }),
    Some(SyscallMeta { name: "fchown32", nb_args: 3 }),
    Some(SyscallMeta { name: "setresuid32", nb_args: 3 }),
    Some(SyscallMeta { name: "getresuid32", nb_args: 3 }),
    Some(SyscallMeta { name: "setresgid32", nb_args: 3 }),
    Some(SyscallMeta { name: "getresgid32", nb_args: 3 }),
    Some(SyscallMeta { name: "chown32", nb_args: 3 }),
    Some(SyscallMeta { name: "setuid32", nb_args: 1 }),
    Some(SyscallMeta { name: "setgid32", nb_args: 1 }),
    Some(SyscallMeta { name: "setfsuid32", nb_args: 1 }),
    Some(SyscallMeta { name: "setfsgid32", nb_args: 1 }),
    Some(SyscallMeta { name: "pivot_root", nb_args: 2 }),
    Some(SyscallMeta { name: "mincore", nb_args: 3 }),
    Some(SyscallMeta { name: "madvise", nb_args: 3 }),
    Some(SyscallMeta { name: "getdents64", nb_args: 3 }),
    Some(SyscallMeta { name: "fcntl64", nb_args: 3 }),
    None,
    None,
    Some(SyscallMeta { name: "gettid", nb_args: 0 }),
    Some(SyscallMeta { name: "readahead", nb_args: 3 }),
    Some(SyscallMeta { name: "setxattr", nb_args: 5 }),
    Some(SyscallMeta { name: "lsetxattr", nb_args: 5 }),
    Some(SyscallMeta { name: "fsetxattr", nb_args: 5 }),
    Some(SyscallMeta { name: "getxattr", nb_args: 4 }),
    Some(SyscallMeta { name: "lgetxattr", nb_args: 4 }),
    Some(SyscallMeta { name: "fgetxattr", nb_args: 4 }),
    Some(SyscallMeta { name: "listxattr", nb_args: 3 }),
    Some(SyscallMeta { name: "llistxattr", nb_args: 3 }),
    Some(SyscallMeta { name: "flistxattr", nb_args: 3 }),
    Some(SyscallMeta { name: "removexattr", nb_args: 2 }),
    Some(SyscallMeta { name: "lremovexattr", nb_args: 2 }),
    Some(SyscallMeta { name: "fremovexattr", nb_args: 2 }),
    Some(SyscallMeta { name: "tkill", nb_args: 2 }),
    Some(SyscallMeta { name: "sendfile64", nb_args: 4 }),
    Some(SyscallMeta { name: "futex", nb_args: 6 }),
    Some(SyscallMeta { name: "sched_setaffinity", nb_args: 3 }),
    Some(SyscallMeta { name: "sched_getaffinity", nb_args: 3 }),
    Some(SyscallMeta { name: "set_thread_area", nb_args: 1 }),
    Some(SyscallMeta { name: "get_thread_area", nb_args: 1 }),
    Some(SyscallMeta { name: "io_setup", nb_args: 2 }),
    Some(SyscallMeta { name: "io_destroy", nb_args: 1 }),
    Some(SyscallMeta { name: "io_getevents", nb_args: 5 }),
    Some(SyscallMeta { name: "io_submit", nb_args: 3 }),
    Some(SyscallMeta { name: "io_cancel", nb_args: 3 }),
    Some(SyscallMeta { name: "fadvise64", nb_args: 4 }),
    None,
    Some(SyscallMeta { name: "exit_group", nb_args: 1 }),
    Some(SyscallMeta { name: "lookup_dcookie", nb_args: 3 }),
    Some(SyscallMeta { name: "epoll_create", nb_args: 1 }),
    Some(SyscallMeta { name: "epoll_ctl", nb_args: 4 }),
    Some(SyscallMeta { name: "epoll_wait", nb_args: 4 }),
    Some(SyscallMeta { name: "remap_file_pages", nb_args: 5 }),
    Some(SyscallMeta { name: "set_tid_address", nb_args: 1 }),
    Some(SyscallMeta { name: "timer_create", nb_args: 3 }),
    Some(SyscallMeta { name: "timer_settime", nb_args: 4 }),
    Some(SyscallMeta { name: "timer_gettime", nb_args: 2 }),
    Some(SyscallMeta { name: "timer_getoverrun", nb_args: 1 }),
    Some(SyscallMeta { name: "timer_delete", nb_args: 1 }),
    Some(SyscallMeta { name: "clock_settime", nb_args: 2 }),
    Some(SyscallMeta { name: "clock_gettime", nb_args: 2 }),
    Some(SyscallMeta { name: "clock_getres", nb_args: 2 }),
    Some(SyscallMeta { name: "clock_nanosleep", nb_args: 4 }),
    Some(SyscallMeta { name: "statfs64", nb_args: 3 }),
    Some(SyscallMeta { name: "fstatfs64", nb_args: 3 }),
    Some(SyscallMeta { name: "tgkill", nb_args: 3 }),
    Some(SyscallMeta { name: "utimes", nb_args: 2 }),
    Some(SyscallMeta { name: "fadvise64_64", nb_args: 4 }),
    None,
    Some(SyscallMeta { name: "mbind", nb_args: 6 }),
    Some(SyscallMeta { name: "get_mempolicy", nb_args: 5 }),
    Some(SyscallMeta { name: "set_mempolicy", nb_args: 3 }),
    Some(SyscallMeta { name: "mq_open", nb_args: 4 }),
    Some(SyscallMeta { name: "mq_unlink", nb_args: 1 }),
    Some(SyscallMeta { name: "mq_timedsend", nb_args: 5 }),
    Some(SyscallMeta { name: "mq_timedreceive", nb_args: 5 }),
    Some(SyscallMeta { name: "mq_notify", nb_args: 2 }),
    Some(SyscallMeta { name: "mq_getsetattr", nb_args: 3 }),
    Some(SyscallMeta { name: "kexec_load", nb_args: 4 }),
    Some(SyscallMeta { name: "waitid", nb_args: 5 }),
    None,
    Some(SyscallMeta { name: "add_key", nb_args: 5 }),
    Some(SyscallMeta { name: "request_key", nb_args: 4 }),
    Some(SyscallMeta { name: "keyctl", nb_args: 5 }),
    Some(SyscallMeta { name: "ioprio_set", nb_args: 3 }),
    Some(SyscallMeta { name: "ioprio_get", nb_args: 2 }),
    Some(SyscallMeta { name: "inotify_init", nb_args: 0 }),
    Some(SyscallMeta { name: "inotify_add_watch", nb_args: 3 }),
    Some(SyscallMeta { name: "inotify_rm_watch", nb_args: 2 }),
    Some(SyscallMeta { name: "migrate_pages", nb_args: 4 }),
    Some(SyscallMeta { name: "openat", nb_args: 4 }),
    Some(SyscallMeta { name: "mkdirat", nb_args: 3 }),
    Some(SyscallMeta { name: "mknodat", nb_args: 4 }),
    Some(SyscallMeta { name: "fchownat", nb_args: 5 }),
    Some(SyscallMeta { name: "futimesat", nb_args: 3 }),
    Some(SyscallMeta { name: "fstatat64", nb_args: 4 }),
    Some(SyscallMeta { name: "unlinkat", nb_args: 3 }),
    Some(SyscallMeta { name: "renameat", nb_args: 4 }),
    Some(SyscallMeta { name: "linkat", nb_args: 5 }),
    Some(SyscallMeta { name: "symlinkat", nb_args: 3 }),
    Some(SyscallMeta { name: "readlinkat", nb_args: 4 }),
    Some(SyscallMeta { name: "fchmodat", nb_args: 3 }),
    Some(SyscallMeta { name: "faccessat", nb_args: 3 }),
    Some(SyscallMeta { name: "pselect6", nb_args: 6 }),
    Some(SyscallMeta { name: "ppoll", nb_args: 5 }),
    Some(SyscallMeta { name: "unshare", nb_args: 1 }),
    Some(SyscallMeta { name: "set_robust_list", nb_args: 2 }),
    Some(SyscallMeta { name: "get_robust_list", nb_args: 3 }),
    Some(SyscallMeta { name: "splice", nb_args: 6 }),
    Some(SyscallMeta { name: "sync_file_range", nb_args: 4 }),
    Some(SyscallMeta { name: "tee", nb_args: 4 }),
    Some(SyscallMeta { name: "vmsplice", nb_args: 4 }),
    Some(SyscallMeta { name: "move_pages", nb_args: 6 }),
    Some(SyscallMeta { name: "getcpu", nb_args: 3 }),
    Some(SyscallMeta { name: "epoll_pwait", nb_args: 6 }),
    Some(SyscallMeta { name: "utimensat", nb_args: 4 }),
    Some(SyscallMeta { name: "signalfd", nb_args: 3 }),
    Some(SyscallMeta { name: "timerfd_create", nb_args: 2 }),
    Some(SyscallMeta { name: "eventfd", nb_args: 1 }),
    Some(SyscallMeta { name: "fallocate", nb_args: 4 }),
    Some(SyscallMeta { name: "timerfd_settime", nb_args: 4 }),
    Some(SyscallMeta { name: "timerfd_gettime", nb_args: 2 }),
    Some(SyscallMeta { name: "signalfd4", nb_args: 4 }),
    Some(SyscallMeta { name: "eventfd2", nb_args: 2 }),
    Some(SyscallMeta { name: "epoll_create1", nb_args: 1 }),
    Some(SyscallMeta { name: "dup3", nb_args: 3 }),
    Some(SyscallMeta { name: "pipe2", nb_args: 2 }),
    Some(SyscallMeta { name: "inotify_init1", nb_args: 1 }),
    Some(SyscallMeta { name: "preadv", nb_args: 5 }),
    Some(SyscallMeta { name: "pwritev", nb_args: 5 }),
    Some(SyscallMeta { name: "rt_tgsigqueueinfo", nb_args: 4 }),
    Some(SyscallMeta { name: "perf_event_open", nb_args: 5 }),
    Some(SyscallMeta { name: "recvmmsg", nb_args: 5 }),
];
