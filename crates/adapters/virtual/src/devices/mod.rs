//! Virtual device implementations — relay, sensors, buttons.
//!
//! Each device keeps its identity from the controller configuration so the
//! events it emits are addressed exactly like the real hardware's.

mod button;
mod relay;
mod sensor;

pub use button::VirtualButton;
pub use relay::VirtualRelay;
pub use sensor::{VirtualLuxSensor, VirtualMotionSensor};

use std::sync::{Mutex, MutexGuard, PoisonError};

fn read<T: Copy>(cell: &Mutex<T>) -> T {
    cell.lock().map_or_else(|poisoned| *poisoned.into_inner(), |g| *g)
}

fn write<T>(cell: &Mutex<T>) -> MutexGuard<'_, T> {
    cell.lock().unwrap_or_else(PoisonError::into_inner)
}
