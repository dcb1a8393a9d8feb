//! USB descriptor constants and writers.
//!
//! Parts render their own descriptor bytes.  These helpers write the
//! standard interface, endpoint and configuration layouts so a part only
//! has to supply the numbers the layout pass assigned to it.
//!
//! Layouts (USB 2.0 §9.6):
//! ```text
//! Configuration (9): bLength, bDescriptorType=2, wTotalLength(le16),
//!                    bNumInterfaces, bConfigurationValue, iConfiguration,
//!                    bmAttributes, bMaxPower (2 mA units)
//! Interface (9):     bLength, bDescriptorType=4, bInterfaceNumber,
//!                    bAlternateSetting, bNumEndpoints, bInterfaceClass,
//!                    bInterfaceSubClass, bInterfaceProtocol, iInterface
//! Endpoint (7):      bLength, bDescriptorType=5, bEndpointAddress,
//!                    bmAttributes, wMaxPacketSize(le16), bInterval
//! ```

use crate::part::{Direction, TransferType};

/// Descriptor type codes.
pub const DESCRIPTOR_TYPE_CONFIGURATION: u8 = 0x02;
pub const DESCRIPTOR_TYPE_STRING: u8 = 0x03;
pub const DESCRIPTOR_TYPE_INTERFACE: u8 = 0x04;
pub const DESCRIPTOR_TYPE_ENDPOINT: u8 = 0x05;

/// Fixed descriptor sizes (bytes).
pub const CONFIGURATION_HEADER_SIZE: usize = 9;
pub const INTERFACE_DESCRIPTOR_SIZE: usize = 9;
pub const ENDPOINT_DESCRIPTOR_SIZE: usize = 7;

/// Direction bit of `bEndpointAddress`.
pub const ENDPOINT_DIR_IN: u8 = 0x80;

/// `bmAttributes` bit 7 is reserved and must be set.
const CONFIG_ATTR_RESERVED: u8 = 0x80;
const CONFIG_ATTR_SELF_POWERED: u8 = 0x40;

/// Length of a string descriptor holding `chars` UTF-16 code units.
pub const fn string_descriptor_len(chars: usize) -> usize {
    2 + 2 * chars
}

/// `bEndpointAddress` for an endpoint number and direction.
pub const fn endpoint_address(number: u8, direction: Direction) -> u8 {
    match direction {
        Direction::In => ENDPOINT_DIR_IN | (number & 0x0F),
        Direction::Out => number & 0x0F,
    }
}

/// Fields of a standard interface descriptor.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InterfaceFields {
    pub number: u8,
    pub alternate_setting: u8,
    pub num_endpoints: u8,
    pub class: u8,
    pub subclass: u8,
    pub protocol: u8,
    pub string_index: u8,
}

/// Write a 9-byte interface descriptor.
/// Returns the number of bytes written, or 0 if `buf` is too small.
pub fn write_interface(buf: &mut [u8], fields: &InterfaceFields) -> usize {
    if buf.len() < INTERFACE_DESCRIPTOR_SIZE {
        return 0;
    }
    buf[0] = INTERFACE_DESCRIPTOR_SIZE as u8;
    buf[1] = DESCRIPTOR_TYPE_INTERFACE;
    buf[2] = fields.number;
    buf[3] = fields.alternate_setting;
    buf[4] = fields.num_endpoints;
    buf[5] = fields.class;
    buf[6] = fields.subclass;
    buf[7] = fields.protocol;
    buf[8] = fields.string_index;
    INTERFACE_DESCRIPTOR_SIZE
}

/// Write a 7-byte endpoint descriptor.
/// Returns the number of bytes written, or 0 if `buf` is too small.
pub fn write_endpoint(
    buf: &mut [u8],
    number: u8,
    direction: Direction,
    transfer: TransferType,
    max_packet_size: u16,
    interval: u8,
) -> usize {
    if buf.len() < ENDPOINT_DESCRIPTOR_SIZE {
        return 0;
    }
    let [lo, hi] = max_packet_size.to_le_bytes();
    buf[0] = ENDPOINT_DESCRIPTOR_SIZE as u8;
    buf[1] = DESCRIPTOR_TYPE_ENDPOINT;
    buf[2] = endpoint_address(number, direction);
    buf[3] = transfer.attributes();
    buf[4] = lo;
    buf[5] = hi;
    buf[6] = interval;
    ENDPOINT_DESCRIPTOR_SIZE
}

/// Write the 9-byte configuration header.
/// Returns the number of bytes written, or 0 if `buf` is too small.
pub fn write_configuration_header(
    buf: &mut [u8],
    total_length: u16,
    num_interfaces: u8,
    configuration_value: u8,
    self_powered: bool,
    max_power_ma: u16,
) -> usize {
    if buf.len() < CONFIGURATION_HEADER_SIZE {
        return 0;
    }
    let [lo, hi] = total_length.to_le_bytes();
    let mut attributes = CONFIG_ATTR_RESERVED;
    if self_powered {
        attributes |= CONFIG_ATTR_SELF_POWERED;
    }
    buf[0] = CONFIGURATION_HEADER_SIZE as u8;
    buf[1] = DESCRIPTOR_TYPE_CONFIGURATION;
    buf[2] = lo;
    buf[3] = hi;
    buf[4] = num_interfaces;
    buf[5] = configuration_value;
    buf[6] = 0;
    buf[7] = attributes;
    // bMaxPower is in 2 mA units.
    buf[8] = (max_power_ma / 2).min(u8::MAX as u16) as u8;
    CONFIGURATION_HEADER_SIZE
}
