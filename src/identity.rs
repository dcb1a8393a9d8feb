//! Device identity - vendor/product IDs and string descriptors.
//!
//! Strings are stored pre-encoded as USB string descriptors:
//! ```text
//! Byte 0:    bLength (2 + 2 * characters)
//! Byte 1:    bDescriptorType (0x03)
//! Byte 2..:  one content byte + one zero byte per character
//! ```
//! Only the ASCII range is encoded; anything else becomes `?`.

use heapless::{String, Vec};

use crate::config::{
    DEFAULT_MANUFACTURER, DEFAULT_PRODUCT, DEFAULT_PRODUCT_ID, DEFAULT_SERIAL, DEFAULT_VENDOR_ID,
    MAX_MANUFACTURER_LENGTH, MAX_PRODUCT_LENGTH, MAX_SERIAL_NUMBER_LENGTH,
};
use crate::descriptor::{string_descriptor_len, DESCRIPTOR_TYPE_STRING};

/// Longest string descriptor any identity field can hold (bytes).
pub const MAX_STRING_DESCRIPTOR_LEN: usize = string_descriptor_len(max(
    MAX_MANUFACTURER_LENGTH,
    max(MAX_PRODUCT_LENGTH, MAX_SERIAL_NUMBER_LENGTH),
));

const MAX_STRING_CHARS: usize = (MAX_STRING_DESCRIPTOR_LEN - 2) / 2;

/// An encoded USB string descriptor.
pub type StringDescriptor = Vec<u8, MAX_STRING_DESCRIPTOR_LEN>;

/// Length of a hex-encoded device ID string.
pub const DEVICE_ID_STRING_LEN: usize = 20;

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// Encode `s` as a string descriptor of at most `max_chars` characters.
pub fn encode_string(s: &str, max_chars: usize) -> StringDescriptor {
    let max_chars = max_chars.min(MAX_STRING_CHARS);
    let mut out = StringDescriptor::new();
    // Capacity is at least 2 + 2 * max_chars, so pushes below cannot fail.
    let _ = out.push(0);
    let _ = out.push(DESCRIPTOR_TYPE_STRING);
    for c in s.chars().take(max_chars) {
        let b = if c.is_ascii() { c as u8 } else { b'?' };
        let _ = out.push(b);
        let _ = out.push(0);
    }
    out[0] = out.len() as u8;
    out
}

/// The descriptor for `default`, cut to the lesser of its own length and
/// the length `max_chars` allows.
fn truncated_default(default: &str, max_chars: usize) -> StringDescriptor {
    let mut out = encode_string(default, MAX_STRING_CHARS);
    let n = out.len().min(string_descriptor_len(max_chars));
    out.truncate(n);
    out[0] = n as u8;
    out
}

/// Vendor/product IDs and the three identity strings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeviceIdentity {
    vendor_id: u16,
    product_id: u16,
    manufacturer: StringDescriptor,
    product: StringDescriptor,
    serial: Option<StringDescriptor>,
}

impl Default for DeviceIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl DeviceIdentity {
    /// Default IDs, default strings and the default serial number.
    pub fn new() -> Self {
        let mut identity = Self {
            vendor_id: DEFAULT_VENDOR_ID,
            product_id: DEFAULT_PRODUCT_ID,
            manufacturer: StringDescriptor::new(),
            product: StringDescriptor::new(),
            serial: None,
        };
        identity.set_manufacturer_string(None);
        identity.set_product_string(None);
        identity.set_serial_string(Some(DEFAULT_SERIAL));
        identity
    }

    /// Set the vendor ID.  Zero selects the default.
    pub fn set_vendor_id(&mut self, vendor_id: u16) {
        self.vendor_id = if vendor_id != 0 {
            vendor_id
        } else {
            DEFAULT_VENDOR_ID
        };
    }

    /// Set the product ID.  Zero selects the default.
    pub fn set_product_id(&mut self, product_id: u16) {
        self.product_id = if product_id != 0 {
            product_id
        } else {
            DEFAULT_PRODUCT_ID
        };
    }

    /// Set the manufacturer string.  `None` selects the default.
    pub fn set_manufacturer_string(&mut self, s: Option<&str>) {
        self.manufacturer = match s {
            Some(s) => encode_string(s, MAX_MANUFACTURER_LENGTH),
            None => truncated_default(DEFAULT_MANUFACTURER, MAX_MANUFACTURER_LENGTH),
        };
    }

    /// Set the product string.  `None` selects the default.
    pub fn set_product_string(&mut self, s: Option<&str>) {
        self.product = match s {
            Some(s) => encode_string(s, MAX_PRODUCT_LENGTH),
            None => truncated_default(DEFAULT_PRODUCT, MAX_PRODUCT_LENGTH),
        };
    }

    /// Set the serial number.  `None` reports no serial number to the host.
    pub fn set_serial_string(&mut self, s: Option<&str>) {
        self.serial = s.map(|s| encode_string(s, MAX_SERIAL_NUMBER_LENGTH));
    }

    pub fn vendor_id(&self) -> u16 {
        self.vendor_id
    }

    pub fn product_id(&self) -> u16 {
        self.product_id
    }

    /// Encoded manufacturer string descriptor.
    pub fn manufacturer(&self) -> &[u8] {
        &self.manufacturer
    }

    /// Encoded product string descriptor.
    pub fn product(&self) -> &[u8] {
        &self.product
    }

    /// Encoded serial number descriptor, if one is set.
    pub fn serial(&self) -> Option<&[u8]> {
        self.serial.as_deref()
    }
}

fn push_nibbles(out: &mut String<DEVICE_ID_STRING_LEN>, nibbles: usize, mut id: u32) {
    for _ in 0..nibbles {
        let nibble = (id & 0xF) as u8;
        let c = if nibble <= 9 {
            b'0' + nibble
        } else {
            b'a' + nibble - 10
        };
        let _ = out.push(c as char);
        id >>= 4;
    }
}

/// Hex-encode a 96-bit unique ID, least significant nibble first.
///
/// `half` is the upper half-word of the first ID word; `w1` and `w2` are
/// the remaining two words.  The result is always 20 characters.
pub fn device_id_string(half: u16, w1: u32, w2: u32) -> String<DEVICE_ID_STRING_LEN> {
    let mut out = String::new();
    push_nibbles(&mut out, 4, half as u32);
    push_nibbles(&mut out, 8, w1);
    push_nibbles(&mut out, 8, w2);
    out
}

/// Read the STM32F1 unique device ID and hex-encode it.
///
/// Using this as a serial number reveals the chip ID to every host the
/// device is plugged into; do not use it where the ID is also a secret.
#[cfg(feature = "device-id")]
pub fn read_device_id_string() -> String<DEVICE_ID_STRING_LEN> {
    const UID_BASE: usize = 0x1FFF_F7E8;
    // SAFETY: fixed, always-readable system memory on STM32F1 parts.
    let (half, w1, w2) = unsafe {
        (
            core::ptr::read_volatile((UID_BASE + 0x02) as *const u16),
            core::ptr::read_volatile((UID_BASE + 0x04) as *const u32),
            core::ptr::read_volatile((UID_BASE + 0x08) as *const u32),
        )
    };
    device_id_string(half, w1, w2)
}
