//! Shared infrastructure utilities for Pacer.
//!
//! Cross-cutting helpers that need the filesystem and therefore don't belong
//! in the domain-pure `pacer-types` crate:
//!
//! - **`atomic_write`**: Crash-safe file persistence (temp + rename)
//! - **`device`**: Persistent per-installation device identifier

pub mod atomic_write;
pub mod device;

pub use atomic_write::{AtomicWriteOptions, PersistMode, atomic_write, atomic_write_with_options};
pub use device::{DeviceIdError, DeviceIdStore};
