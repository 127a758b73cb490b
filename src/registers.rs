use serde::{Deserialize, Serialize};
use std::{convert::TryInto, mem::size_of};

/// Register frame of a 32-bit x86 traced unit at a syscall boundary.
///
/// Field order is the kernel's `struct pt_regs`, which is also the layout
/// used for `Regs`/`DivergeRegs` events on the wire.
#[repr(C)]
#[derive(Copy, Clone, Default, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Registers {
    pub ebx: u32,
    pub ecx: u32,
    pub edx: u32,
    pub esi: u32,
    pub edi: u32,
    pub ebp: u32,
    pub eax: u32,
    pub xds: u32,
    pub xes: u32,
    pub xfs: u32,
    pub xgs: u32,
    pub orig_eax: u32,
    pub eip: u32,
    pub xcs: u32,
    pub eflags: u32,
    pub esp: u32,
    pub xss: u32,
}

pub const REGISTERS_SIZE: usize = size_of::<Registers>();
const REGISTER_COUNT: usize = REGISTERS_SIZE / 4;

const_assert_eq!(REGISTERS_SIZE, 68);

impl Registers {
    /// Registers as the unit sees them when it enters syscall `nr`.
    pub fn for_syscall(nr: i32, args: &[u64]) -> Registers {
        let mut r = Registers::default();
        r.eax = nr as u32;
        r.orig_eax = nr as u32;
        for (i, a) in args.iter().take(6).enumerate() {
            r.set_arg(i, *a);
        }
        r
    }

    pub fn original_syscallno(&self) -> i32 {
        self.orig_eax as i32
    }

    /// Syscall argument `i` (0 based), in the order the kernel passes them.
    pub fn arg(&self, i: usize) -> u64 {
        let v = match i {
            0 => self.ebx,
            1 => self.ecx,
            2 => self.edx,
            3 => self.esi,
            4 => self.edi,
            5 => self.ebp,
            _ => panic!("Syscalls have at most 6 arguments, asked for {}", i),
        };
        v as u64
    }

    pub fn set_arg(&mut self, i: usize, value: u64) {
        let v = value as u32;
        match i {
            0 => self.ebx = v,
            1 => self.ecx = v,
            2 => self.edx = v,
            3 => self.esi = v,
            4 => self.edi = v,
            5 => self.ebp = v,
            _ => panic!("Syscalls have at most 6 arguments, asked for {}", i),
        }
    }

    pub fn syscall_result_signed(&self) -> i64 {
        self.eax as i32 as i64
    }

    pub fn set_syscall_result(&mut self, result: i64) {
        self.eax = result as u32;
    }

    pub fn syscall_failed(&self) -> bool {
        let result = self.syscall_result_signed();
        -4096 < result && result < 0
    }

    /// Copy with the bits that are known to be noise cleared. The high
    /// halves of the segment selectors and of eflags sometimes come back
    /// non-zero from the kernel.
    pub fn normalized(&self) -> Registers {
        let mut r = *self;
        r.xgs &= 0xFFFF;
        r.xfs &= 0xFFFF;
        r.xes &= 0xFFFF;
        r.xds &= 0xFFFF;
        r.eflags &= 0xFFFF;
        r.xcs &= 0xFFFF;
        r.xss &= 0xFFFF;
        r
    }

    fn words(&self) -> [u32; REGISTER_COUNT] {
        [
            self.ebx,
            self.ecx,
            self.edx,
            self.esi,
            self.edi,
            self.ebp,
            self.eax,
            self.xds,
            self.xes,
            self.xfs,
            self.xgs,
            self.orig_eax,
            self.eip,
            self.xcs,
            self.eflags,
            self.esp,
            self.xss,
        ]
    }

    pub fn to_bytes(&self) -> [u8; REGISTERS_SIZE] {
        let mut out = [0u8; REGISTERS_SIZE];
        for (chunk, w) in out.chunks_exact_mut(4).zip(self.words().iter()) {
            chunk.copy_from_slice(&w.to_le_bytes());
        }
        out
    }

    pub fn from_bytes(data: &[u8]) -> Option<Registers> {
        if data.len() != REGISTERS_SIZE {
            return None;
        }
        let w: [u32; REGISTER_COUNT] = array_init::array_init(|i| {
            // Length checked above.
            u32::from_le_bytes(data[i * 4..i * 4 + 4].try_into().unwrap_or([0; 4]))
        });
        Some(Registers {
            ebx: w[0],
            ecx: w[1],
            edx: w[2],
            esi: w[3],
            edi: w[4],
            ebp: w[5],
            eax: w[6],
            xds: w[7],
            xes: w[8],
            xfs: w[9],
            xgs: w[10],
            orig_eax: w[11],
            eip: w[12],
            xcs: w[13],
            eflags: w[14],
            esp: w[15],
            xss: w[16],
        })
    }
}
