//! Configuration descriptor assembly.
//!
//! Part descriptor bytes are not parsed or checked here.  Each part gets
//! exactly the slice the layout reserved for it, after it has been told
//! its first interface and endpoint numbers.

use crate::config::{CONFIGURATION_VALUE, MAX_DESCRIPTOR_DATA_SIZE, MAX_POWER_MA, SELF_POWERED};
use crate::descriptor::{write_configuration_header, CONFIGURATION_HEADER_SIZE};
use crate::layout::Layout;
use crate::part::UsbPart;

/// Largest configuration descriptor the buffer holds (bytes).
pub const CONFIGURATION_DESCRIPTOR_CAPACITY: usize =
    CONFIGURATION_HEADER_SIZE + MAX_DESCRIPTOR_DATA_SIZE;

/// Fixed buffer holding the composed configuration descriptor.
pub struct ConfigurationDescriptor {
    buf: [u8; CONFIGURATION_DESCRIPTOR_CAPACITY],
    len: usize,
}

impl Default for ConfigurationDescriptor {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationDescriptor {
    pub const fn new() -> Self {
        Self {
            buf: [0; CONFIGURATION_DESCRIPTOR_CAPACITY],
            len: 0,
        }
    }

    /// Hand every part its numbers, let it render into its slot, then
    /// write the header.
    ///
    /// `parts` must be the part list `layout` was planned from.
    pub fn assemble<'a, I>(&mut self, parts: I, layout: &Layout)
    where
        I: IntoIterator<Item = &'a dyn UsbPart>,
    {
        let (header, body) = self.buf.split_at_mut(CONFIGURATION_HEADER_SIZE);
        body.fill(0);

        for (part, placement) in parts.into_iter().zip(layout.placements()) {
            part.set_start_interface(placement.first_interface);
            part.set_start_endpoint(placement.first_endpoint);
            let start = placement.descriptor_offset;
            let end = start + placement.descriptor_len;
            part.render_descriptor(&mut body[start..end]);
        }

        write_configuration_header(
            header,
            layout.total_length() as u16,
            layout.num_interfaces(),
            CONFIGURATION_VALUE,
            SELF_POWERED,
            MAX_POWER_MA,
        );
        self.len = layout.total_length();
    }

    /// Drop the assembled descriptor.
    pub fn reset(&mut self) {
        self.len = 0;
    }

    /// The assembled descriptor; empty before the first assembly.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
