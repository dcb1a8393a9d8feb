//! Contract with the low-level USB peripheral engine.
//!
//! The engine owns enumeration, the control-transfer state machine,
//! physical transfers and interrupt delivery.  This layer only hands it a
//! finished configuration and switches it on and off.  The helpers at the
//! bottom fan bus events out to the parts; engines call them from their
//! own interrupt handlers.

use crate::dispatch::DispatchTable;
use crate::identity::DeviceIdentity;
use crate::layout::Layout;
use crate::part::{SetupResult, UsbPart};

/// Identity pushed to the engine before activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineIdentity<'a> {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Encoded string descriptors.
    pub manufacturer: &'a [u8],
    pub product: &'a [u8],
    /// `None` reports no serial number to the host.
    pub serial: Option<&'a [u8]>,
}

impl<'a> From<&'a DeviceIdentity> for EngineIdentity<'a> {
    fn from(identity: &'a DeviceIdentity) -> Self {
        Self {
            vendor_id: identity.vendor_id(),
            product_id: identity.product_id(),
            manufacturer: identity.manufacturer(),
            product: identity.product(),
            serial: identity.serial(),
        }
    }
}

/// A finished configuration ready to be served.
#[derive(Clone, Copy)]
pub struct EngineSetup<'a> {
    /// Parts in registration order; `layout` indexes into this.
    pub parts: &'a [&'static dyn UsbPart],
    /// Endpoint addresses and packet memory offsets.  The engine sizes its
    /// endpoint tables from [`Layout::num_endpoints`].
    pub layout: &'a Layout,
    /// The complete configuration descriptor, header included.
    pub configuration_descriptor: &'a [u8],
    /// Table the engine's endpoint interrupts dispatch through.
    pub dispatch: &'static DispatchTable,
}

/// Operations this layer needs from the peripheral engine.
pub trait UsbEngine {
    /// Set IDs and string descriptors.
    fn set_identity(&mut self, identity: &EngineIdentity<'_>);

    /// Take over a finished configuration.  Called while disabled.
    fn load(&mut self, setup: &EngineSetup<'_>);

    /// Connect to the bus.
    fn enable(&mut self);

    /// Disconnect from the bus.
    fn disable(&mut self);

    fn is_connected(&self) -> bool;

    fn is_configured(&self) -> bool;
}

/// Forward a bus reset to every part.
pub fn notify_reset(parts: &[&'static dyn UsbPart]) {
    parts.iter().for_each(|p| p.usb_reset());
}

/// Forward a SET_CONFIGURATION to every part.
pub fn notify_set_configuration(parts: &[&'static dyn UsbPart]) {
    parts.iter().for_each(|p| p.usb_set_configuration());
}

/// Forward a CLEAR_FEATURE to every part.
pub fn notify_clear_feature(parts: &[&'static dyn UsbPart]) {
    parts.iter().for_each(|p| p.usb_clear_feature());
}

/// Offer a class request with a data stage to each part in turn.
/// The first answer other than `Unsupported` wins.
pub fn data_setup(parts: &[&'static dyn UsbPart], request: u8) -> SetupResult {
    first_supported(parts, |p| p.control_data_setup(request))
}

/// Offer a class request without a data stage to each part in turn.
pub fn no_data_setup(parts: &[&'static dyn UsbPart], request: u8) -> SetupResult {
    first_supported(parts, |p| p.control_no_data_setup(request))
}

fn first_supported(
    parts: &[&'static dyn UsbPart],
    f: impl Fn(&dyn UsbPart) -> SetupResult,
) -> SetupResult {
    parts
        .iter()
        .map(|p| f(*p))
        .find(|r| *r != SetupResult::Unsupported)
        .unwrap_or(SetupResult::Unsupported)
}

#[cfg(test)]
mod tests {
    use core::sync::atomic::{AtomicU32, Ordering};

    use super::*;
    use crate::part::EndpointInfo;

    struct Responder {
        answers: Option<u8>,
        result: SetupResult,
        resets: AtomicU32,
        asked: AtomicU32,
    }

    impl Responder {
        const fn new(answers: Option<u8>, result: SetupResult) -> Self {
            Self {
                answers,
                result,
                resets: AtomicU32::new(0),
                asked: AtomicU32::new(0),
            }
        }
    }

    impl UsbPart for Responder {
        fn num_interfaces(&self) -> u8 {
            1
        }
        fn endpoints(&self) -> &[EndpointInfo] {
            &[]
        }
        fn descriptor_size(&self) -> usize {
            0
        }
        fn set_start_interface(&self, _first: u8) {}
        fn set_start_endpoint(&self, _first: u8) {}
        fn render_descriptor(&self, _out: &mut [u8]) {}
        fn usb_reset(&self) {
            self.resets.fetch_add(1, Ordering::Relaxed);
        }
        fn control_data_setup(&self, request: u8) -> SetupResult {
            self.asked.fetch_add(1, Ordering::Relaxed);
            if self.answers == Some(request) {
                self.result
            } else {
                SetupResult::Unsupported
            }
        }
    }

    #[test]
    fn first_claiming_part_answers() {
        static A: Responder = Responder::new(Some(0x20), SetupResult::Success);
        static B: Responder = Responder::new(Some(0x21), SetupResult::Error);
        static C: Responder = Responder::new(Some(0x21), SetupResult::Success);
        let parts: [&'static dyn UsbPart; 3] = [&A, &B, &C];

        assert_eq!(data_setup(&parts, 0x21), SetupResult::Error);
        assert_eq!(C.asked.load(Ordering::Relaxed), 0);
        assert_eq!(data_setup(&parts, 0x20), SetupResult::Success);
        assert_eq!(data_setup(&parts, 0x22), SetupResult::Unsupported);
        assert_eq!(no_data_setup(&parts, 0x20), SetupResult::Unsupported);
    }

    #[test]
    fn reset_reaches_every_part() {
        static A: Responder = Responder::new(None, SetupResult::Success);
        static B: Responder = Responder::new(None, SetupResult::Success);
        let parts: [&'static dyn UsbPart; 2] = [&A, &B];
        notify_reset(&parts);
        notify_set_configuration(&parts);
        notify_clear_feature(&parts);
        assert_eq!(A.resets.load(Ordering::Relaxed), 1);
        assert_eq!(B.resets.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn identity_conversion_keeps_missing_serial() {
        let mut id = DeviceIdentity::new();
        id.set_serial_string(None);
        let e = EngineIdentity::from(&id);
        assert_eq!(e.vendor_id, id.vendor_id());
        assert_eq!(e.manufacturer, id.manufacturer());
        assert!(e.serial.is_none());
    }
}
