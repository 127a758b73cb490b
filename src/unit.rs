use std::sync::{Arc, Mutex, Weak};

pub mod syscall_bitmap;
pub mod traced_unit;
pub mod unit_flags;

pub type UnitSharedPtr = Arc<Mutex<traced_unit::TracedUnit>>;
pub type UnitSharedWeakPtr = Weak<Mutex<traced_unit::TracedUnit>>;
