//! Composite USB device layer.
//!
//! Combines several independent USB parts (serial, HID, mass storage,
//! MIDI, ...) into one device with a single configuration descriptor:
//!
//! 1. Parts register with a [`CompositeDevice`] together with optional
//!    init/stop hooks.
//! 2. [`CompositeDevice::begin`] runs the init hooks, lays out interface
//!    numbers, endpoint numbers and packet memory ([`layout::plan`]),
//!    assembles the configuration descriptor and rebuilds the endpoint
//!    [`dispatch`] table.
//! 3. The finished configuration goes to the [`UsbEngine`], which owns
//!    the bus and routes endpoint interrupts back through the trampolines.
//!
//! Usage: `cargo test` runs everything on the host.  Firmware builds
//! enable `cortex-m` (critical sections) and usually `defmt`.

#![cfg_attr(not(test), no_std)]

#[macro_use]
mod fmt;

pub mod assemble;
pub mod config;
pub mod descriptor;
pub mod device;
pub mod dispatch;
pub mod engine;
pub mod error;
pub mod identity;
pub mod layout;
pub mod part;
pub mod registry;

// ═══════════════════════════════════════════════════════════════════════════
// Re-exports
// ═══════════════════════════════════════════════════════════════════════════

pub use device::CompositeDevice;
pub use dispatch::{DispatchTable, Handler, DISPATCH, EP_IN_TRAMPOLINES, EP_OUT_TRAMPOLINES};
pub use engine::{EngineIdentity, EngineSetup, UsbEngine};
pub use error::Error;
pub use identity::DeviceIdentity;
pub use layout::{EndpointAllocation, Layout, PartPlacement};
pub use part::{Direction, EndpointInfo, HandlerId, SetupResult, TransferType, UsbPart};
pub use registry::{InitHook, PartContext, StopHook};
