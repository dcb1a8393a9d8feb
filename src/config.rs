//! Hardware limits and compile-time defaults.
//!
//! All ceilings the layout pass enforces, the packet-memory map of the
//! USB peripheral, and the identity defaults live here so they can be
//! tuned in one place for a different part.

// Composition limits

/// Maximum number of parts that can be registered at once.
pub const MAX_PARTS: usize = 6;

/// Maximum number of endpoints, including the control endpoint 0.
pub const MAX_ENDPOINTS: usize = 8;

/// Dispatch slots per direction.  Endpoint address `n` maps to slot `n - 1`.
pub const DISPATCH_SLOTS: usize = MAX_ENDPOINTS - 1;

/// Maximum number of bytes of part descriptor data following the
/// configuration header.
pub const MAX_DESCRIPTOR_DATA_SIZE: usize = 200;

// Packet memory (PMA)
//
//   0x000 .. 0x040   buffer descriptor table
//   0x040 .. 0x080   EP0 TX
//   0x080 .. 0x0C0   EP0 RX
//   0x0C0 .. 0x200   part endpoint buffers

/// Total size of the on-chip packet memory area (bytes).
pub const PMA_MEMORY_SIZE: u16 = 512;

/// Size of each control endpoint buffer (bytes).
pub const EP0_BUFFER_SIZE: u16 = 0x40;

/// Packet memory offset of the control endpoint TX buffer.
pub const EP0_TX_BUFFER_ADDRESS: u16 = 0x40;

/// Packet memory offset of the control endpoint RX buffer.
pub const EP0_RX_BUFFER_ADDRESS: u16 = EP0_TX_BUFFER_ADDRESS + EP0_BUFFER_SIZE;

/// First packet memory offset available to part endpoints.
pub const PMA_PART_START: u16 = EP0_RX_BUFFER_ADDRESS + EP0_BUFFER_SIZE;

// Identity defaults

/// Vendor ID used when zero is supplied.
pub const DEFAULT_VENDOR_ID: u16 = 0x1EAF;

/// Product ID used when zero is supplied.
pub const DEFAULT_PRODUCT_ID: u16 = 0x0024;

/// Manufacturer string reported when none is configured.
pub const DEFAULT_MANUFACTURER: &str = "LeafLabs";

/// Product string reported when none is configured.
pub const DEFAULT_PRODUCT: &str = "Maple";

/// Serial number reported by a freshly constructed device.
pub const DEFAULT_SERIAL: &str = "00000000000000000001";

/// Maximum manufacturer string length (characters).
pub const MAX_MANUFACTURER_LENGTH: usize = 32;

/// Maximum product string length (characters).
pub const MAX_PRODUCT_LENGTH: usize = 32;

/// Maximum serial number length (characters).
pub const MAX_SERIAL_NUMBER_LENGTH: usize = 20;

// Configuration descriptor

/// `bConfigurationValue` of the single configuration.
pub const CONFIGURATION_VALUE: u8 = 1;

/// Bus power drawn in the configured state (mA).
pub const MAX_POWER_MA: u16 = 100;

/// Set when the device has its own power supply.
pub const SELF_POWERED: bool = false;
