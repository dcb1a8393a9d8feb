//! Part capability contract.
//!
//! A part is one self-contained sub-device (serial port, HID, mass
//! storage, MIDI, ...).  It reports what it needs, renders its own
//! descriptor bytes once it knows where it was placed, and receives
//! endpoint and bus events afterwards.
//!
//! Parts are shared with interrupt context through the dispatch table,
//! so every hook takes `&self`; mutable state lives behind a
//! critical-section mutex or atomics inside the part.

/// Endpoint direction, from the host's point of view.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Device to host (TX on the device side).
    In,
    /// Host to device (RX on the device side).
    Out,
}

/// Endpoint transfer type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransferType {
    Control,
    Isochronous,
    Bulk,
    Interrupt,
}

impl TransferType {
    /// Transfer type bits of an endpoint descriptor's `bmAttributes`.
    pub const fn attributes(self) -> u8 {
        match self {
            TransferType::Control => 0x00,
            TransferType::Isochronous => 0x01,
            TransferType::Bulk => 0x02,
            TransferType::Interrupt => 0x03,
        }
    }
}

/// Selects which of a part's endpoint handlers an interrupt runs.
///
/// The value is opaque to the composition layer; it is handed back to
/// [`UsbPart::endpoint_event`] unchanged.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct HandlerId(pub u8);

/// One endpoint a part asks for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct EndpointInfo {
    pub direction: Direction,
    pub transfer: TransferType,
    /// Packet memory to reserve for this endpoint (bytes).
    pub buffer_size: u16,
    /// Handler to run on transfer completion.  `None` installs a no-op.
    pub handler: Option<HandlerId>,
}

impl EndpointInfo {
    pub const fn new(
        direction: Direction,
        transfer: TransferType,
        buffer_size: u16,
        handler: Option<HandlerId>,
    ) -> Self {
        Self {
            direction,
            transfer,
            buffer_size,
            handler,
        }
    }
}

/// Outcome of a class-specific control request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SetupResult {
    /// The request was handled.
    Success,
    /// The request was recognised but failed; the engine stalls EP0.
    Error,
    /// Not this part's request.
    Unsupported,
    /// Recognised, but the part cannot answer yet.
    NotReady,
}

/// Capability interface every part implements.
///
/// A part is identified by its address (see [`same_part`]).  Zero-sized
/// types have no address of their own, so two distinct zero-sized statics
/// may compare equal; give a part at least one byte of state.
pub trait UsbPart: Sync {
    /// Number of interfaces this part occupies.
    fn num_interfaces(&self) -> u8;

    /// Endpoints in the order the part wants them numbered.
    fn endpoints(&self) -> &[EndpointInfo];

    /// Exact number of descriptor bytes [`render_descriptor`](Self::render_descriptor) writes.
    fn descriptor_size(&self) -> usize;

    /// First interface number assigned to this part.
    fn set_start_interface(&self, first: u8);

    /// First endpoint number assigned to this part.  Its endpoints are
    /// numbered consecutively from here in [`endpoints`](Self::endpoints) order.
    fn set_start_endpoint(&self, first: u8);

    /// Write the part's descriptor bytes.  `out` is exactly
    /// [`descriptor_size`](Self::descriptor_size) bytes long and is only
    /// handed over after both start numbers have been set.
    fn render_descriptor(&self, out: &mut [u8]);

    /// An endpoint owned by this part completed a transfer.
    /// Runs in interrupt context.
    fn endpoint_event(&self, _handler: HandlerId) {}

    /// Bus reset.
    fn usb_reset(&self) {}

    /// The host selected a configuration.
    fn usb_set_configuration(&self) {}

    /// The host cleared an endpoint feature (usually a halt).
    fn usb_clear_feature(&self) {}

    /// Class request with a data stage.
    fn control_data_setup(&self, _request: u8) -> SetupResult {
        SetupResult::Unsupported
    }

    /// Class request without a data stage.
    fn control_no_data_setup(&self, _request: u8) -> SetupResult {
        SetupResult::Unsupported
    }
}

/// Whether two part references point at the same object.  Only the data
/// address is compared, never the vtable.
pub fn same_part(a: &dyn UsbPart, b: &dyn UsbPart) -> bool {
    core::ptr::addr_eq(a as *const dyn UsbPart, b as *const dyn UsbPart)
}
