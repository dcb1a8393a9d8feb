//! Resource allocation for a set of parts.
//!
//! A single forward pass over the parts in registration order assigns:
//!
//! - interface numbers, from 0
//! - endpoint numbers, from 1 (0 is the control endpoint)
//! - packet memory offsets, from just past the control endpoint buffers
//! - descriptor byte offsets, from 0 (relative to the end of the
//!   configuration header)
//!
//! The pass is pure.  It only reads the parts and produces a [`Layout`];
//! parts learn their numbers when the layout is committed by
//! [`ConfigurationDescriptor::assemble`](crate::assemble::ConfigurationDescriptor::assemble)
//! and [`DispatchTable::install`](crate::dispatch::DispatchTable::install).
//! A failing pass leaves nothing half-written.

use heapless::Vec;

use crate::config::{
    DISPATCH_SLOTS, MAX_DESCRIPTOR_DATA_SIZE, MAX_ENDPOINTS, MAX_PARTS, PMA_MEMORY_SIZE,
    PMA_PART_START,
};
use crate::descriptor::CONFIGURATION_HEADER_SIZE;
use crate::dispatch::Handler;
use crate::error::Error;
use crate::part::{Direction, TransferType, UsbPart};

/// Where one part landed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PartPlacement {
    pub first_interface: u8,
    pub num_interfaces: u8,
    /// First endpoint number.  Equals the next free number when the part
    /// has no endpoints.
    pub first_endpoint: u8,
    pub num_endpoints: u8,
    /// Offset of the part's bytes after the configuration header.
    pub descriptor_offset: usize,
    pub descriptor_len: usize,
}

/// One placed endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointAllocation {
    /// Index of the owning part in registration order.
    pub part: usize,
    /// Index within the part's endpoint list.
    pub index: usize,
    pub direction: Direction,
    pub transfer: TransferType,
    /// Hardware endpoint number (1..[`MAX_ENDPOINTS`]).
    pub address: u8,
    /// Packet memory offset of the endpoint buffer.
    pub buffer_offset: u16,
    pub buffer_size: u16,
    pub handler: Handler,
}

impl EndpointAllocation {
    /// Dispatch slot serving this endpoint.
    pub fn slot(&self) -> usize {
        self.address as usize - 1
    }
}

/// Complete resource assignment for one configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Layout {
    placements: Vec<PartPlacement, MAX_PARTS>,
    endpoints: Vec<EndpointAllocation, DISPATCH_SLOTS>,
    num_interfaces: u8,
    descriptor_len: usize,
    buffer_end: u16,
}

impl Layout {
    /// Per-part placements in registration order.
    pub fn placements(&self) -> &[PartPlacement] {
        &self.placements
    }

    /// Allocated endpoints in address order.
    pub fn endpoints(&self) -> &[EndpointAllocation] {
        &self.endpoints
    }

    /// Total interfaces across all parts.
    pub fn num_interfaces(&self) -> u8 {
        self.num_interfaces
    }

    /// Total endpoints, including the control endpoint.
    pub fn num_endpoints(&self) -> usize {
        self.endpoints.len() + 1
    }

    /// Bytes of part descriptor data.
    pub fn descriptor_len(&self) -> usize {
        self.descriptor_len
    }

    /// `wTotalLength` of the configuration descriptor.
    pub fn total_length(&self) -> usize {
        CONFIGURATION_HEADER_SIZE + self.descriptor_len
    }

    /// First packet memory offset not used by any endpoint.
    pub fn buffer_end(&self) -> u16 {
        self.buffer_end
    }
}

/// Compute the layout for `parts`, in order.
///
/// Fails on the first bound that does not hold: more than [`MAX_PARTS`]
/// parts, more than [`MAX_ENDPOINTS`] endpoints, more than
/// [`MAX_DESCRIPTOR_DATA_SIZE`] descriptor bytes, or packet memory
/// exhausted.
pub fn plan<'a, I>(parts: I) -> Result<Layout, Error>
where
    I: IntoIterator<Item = &'a dyn UsbPart>,
{
    let mut layout = Layout {
        placements: Vec::new(),
        endpoints: Vec::new(),
        num_interfaces: 0,
        descriptor_len: 0,
        buffer_end: PMA_PART_START,
    };
    let mut next_endpoint: usize = 1;

    for (part_index, part) in parts.into_iter().enumerate() {
        let first_interface = layout.num_interfaces;
        layout.num_interfaces = first_interface
            .checked_add(part.num_interfaces())
            .ok_or_else(|| {
                warn!("part {}: interface numbers exhausted", part_index);
                Error::TooManyInterfaces
            })?;

        let endpoints = part.endpoints();
        if next_endpoint + endpoints.len() > MAX_ENDPOINTS {
            warn!(
                "part {}: needs {} endpoints, {} left",
                part_index,
                endpoints.len(),
                MAX_ENDPOINTS - next_endpoint
            );
            return Err(Error::TooManyEndpoints);
        }

        let first_endpoint = next_endpoint as u8;
        for (index, ep) in endpoints.iter().enumerate() {
            let end = layout.buffer_end as u32 + ep.buffer_size as u32;
            if end > PMA_MEMORY_SIZE as u32 {
                warn!(
                    "part {} ep {}: {} bytes do not fit in packet memory",
                    part_index, index, ep.buffer_size
                );
                return Err(Error::BufferPoolExhausted);
            }

            // Bounded by the endpoint check above.
            let _ = layout.endpoints.push(EndpointAllocation {
                part: part_index,
                index,
                direction: ep.direction,
                transfer: ep.transfer,
                address: next_endpoint as u8,
                buffer_offset: layout.buffer_end,
                buffer_size: ep.buffer_size,
                handler: ep.handler.map_or(Handler::Nop, Handler::Part),
            });
            layout.buffer_end = end as u16;
            next_endpoint += 1;
        }

        let descriptor_len = part.descriptor_size();
        if layout.descriptor_len + descriptor_len > MAX_DESCRIPTOR_DATA_SIZE {
            warn!(
                "part {}: descriptor of {} bytes overflows configuration",
                part_index, descriptor_len
            );
            return Err(Error::DescriptorTooLarge);
        }

        layout
            .placements
            .push(PartPlacement {
                first_interface,
                num_interfaces: part.num_interfaces(),
                first_endpoint,
                num_endpoints: endpoints.len() as u8,
                descriptor_offset: layout.descriptor_len,
                descriptor_len,
            })
            .map_err(|_| Error::RegistryFull)?;
        layout.descriptor_len += descriptor_len;
    }

    debug!(
        "layout: {} interfaces, {} endpoints, {} descriptor bytes",
        layout.num_interfaces,
        layout.num_endpoints(),
        layout.descriptor_len
    );
    Ok(layout)
}
