//! Integration tests for the composite device as a firmware would use it.

use std::sync::atomic::{AtomicU32, AtomicU8, Ordering};

use static_cell::StaticCell;

use usb_composite::config::{
    DISPATCH_SLOTS, MAX_DESCRIPTOR_DATA_SIZE, MAX_ENDPOINTS, PMA_MEMORY_SIZE, PMA_PART_START,
};
use usb_composite::descriptor::{
    write_endpoint, write_interface, InterfaceFields, CONFIGURATION_HEADER_SIZE,
    ENDPOINT_DESCRIPTOR_SIZE, INTERFACE_DESCRIPTOR_SIZE,
};
use usb_composite::part::same_part;
use usb_composite::{
    CompositeDevice, Direction, DispatchTable, EndpointInfo, EngineIdentity, EngineSetup, Error,
    HandlerId, TransferType, UsbEngine, UsbPart,
};

fn leak<T: 'static>(value: T) -> &'static T {
    Box::leak(Box::new(value))
}

#[derive(Default)]
struct RecordingEngine {
    enabled: bool,
    descriptor: Vec<u8>,
    endpoints: Vec<(u8, u16)>,
    manufacturer: Vec<u8>,
}

impl UsbEngine for RecordingEngine {
    fn set_identity(&mut self, identity: &EngineIdentity<'_>) {
        self.manufacturer = identity.manufacturer.to_vec();
    }
    fn load(&mut self, setup: &EngineSetup<'_>) {
        self.descriptor = setup.configuration_descriptor.to_vec();
        self.endpoints = setup
            .layout
            .endpoints()
            .iter()
            .map(|ep| (ep.address, ep.buffer_offset))
            .collect();
    }
    fn enable(&mut self) {
        self.enabled = true;
    }
    fn disable(&mut self) {
        self.enabled = false;
    }
    fn is_connected(&self) -> bool {
        self.enabled
    }
    fn is_configured(&self) -> bool {
        self.enabled
    }
}

/// A vendor-class part.  The first interface owns every endpoint; its
/// endpoint descriptors follow it directly.
struct Function {
    interfaces: u8,
    endpoints: Vec<EndpointInfo>,
    first_interface: AtomicU8,
    first_endpoint: AtomicU8,
    events: AtomicU32,
}

impl Function {
    fn new(interfaces: u8, endpoints: Vec<EndpointInfo>) -> &'static Function {
        leak(Function {
            interfaces,
            endpoints,
            first_interface: AtomicU8::new(0),
            first_endpoint: AtomicU8::new(0),
            events: AtomicU32::new(0),
        })
    }
}

impl UsbPart for Function {
    fn num_interfaces(&self) -> u8 {
        self.interfaces
    }
    fn endpoints(&self) -> &[EndpointInfo] {
        &self.endpoints
    }
    fn descriptor_size(&self) -> usize {
        self.interfaces as usize * INTERFACE_DESCRIPTOR_SIZE
            + self.endpoints.len() * ENDPOINT_DESCRIPTOR_SIZE
    }
    fn set_start_interface(&self, first: u8) {
        self.first_interface.store(first, Ordering::Relaxed);
    }
    fn set_start_endpoint(&self, first: u8) {
        self.first_endpoint.store(first, Ordering::Relaxed);
    }
    fn render_descriptor(&self, out: &mut [u8]) {
        let first_interface = self.first_interface.load(Ordering::Relaxed);
        let first_endpoint = self.first_endpoint.load(Ordering::Relaxed);
        let mut n = 0;
        for i in 0..self.interfaces {
            let fields = InterfaceFields {
                number: first_interface + i,
                alternate_setting: 0,
                num_endpoints: if i == 0 { self.endpoints.len() as u8 } else { 0 },
                class: 0xFF,
                subclass: 0,
                protocol: 0,
                string_index: 0,
            };
            n += write_interface(&mut out[n..], &fields);
            if i == 0 {
                for (k, ep) in self.endpoints.iter().enumerate() {
                    n += write_endpoint(
                        &mut out[n..],
                        first_endpoint + k as u8,
                        ep.direction,
                        ep.transfer,
                        ep.buffer_size,
                        0,
                    );
                }
            }
        }
    }
    fn endpoint_event(&self, _handler: HandlerId) {
        self.events.fetch_add(1, Ordering::Relaxed);
    }
}

fn ep(direction: Direction, size: u16) -> EndpointInfo {
    EndpointInfo::new(direction, TransferType::Bulk, size, Some(HandlerId(0)))
}

fn device() -> CompositeDevice<RecordingEngine> {
    CompositeDevice::new(RecordingEngine::default(), leak(DispatchTable::new()))
}

static NO_CONTEXT: () = ();

#[test]
fn serial_and_hid_compose_into_one_configuration() {
    let mut dev = device();
    let serial = Function::new(2, vec![ep(Direction::In, 64), ep(Direction::Out, 64)]);
    let hid = Function::new(
        1,
        vec![EndpointInfo::new(Direction::In, TransferType::Interrupt, 16, None)],
    );
    dev.add(serial, &NO_CONTEXT, None, None).unwrap();
    dev.add(hid, &NO_CONTEXT, None, None).unwrap();
    dev.begin().unwrap();

    let engine = dev.engine();
    assert!(engine.enabled);
    assert_eq!(
        engine.endpoints,
        [
            (1, PMA_PART_START),
            (2, PMA_PART_START + 64),
            (3, PMA_PART_START + 128)
        ]
    );

    let desc = &engine.descriptor;
    let serial_len = 2 * INTERFACE_DESCRIPTOR_SIZE + 2 * ENDPOINT_DESCRIPTOR_SIZE;
    let hid_len = INTERFACE_DESCRIPTOR_SIZE + ENDPOINT_DESCRIPTOR_SIZE;
    assert_eq!(desc.len(), CONFIGURATION_HEADER_SIZE + serial_len + hid_len);
    assert_eq!(
        u16::from_le_bytes([desc[2], desc[3]]) as usize,
        desc.len()
    );
    assert_eq!(desc[4], 3);

    // HID interface number and endpoint address follow the serial part.
    let hid_at = CONFIGURATION_HEADER_SIZE + serial_len;
    assert_eq!(desc[hid_at + 2], 2);
    assert_eq!(desc[hid_at + INTERFACE_DESCRIPTOR_SIZE + 2], 0x83);
}

#[test]
fn endpoint_addresses_and_buffers_strictly_increase() {
    let mut dev = device();
    let sizes: [&[u16]; 4] = [&[8], &[64, 64], &[32], &[16, 16, 8]];
    for s in sizes {
        let eps = s
            .iter()
            .enumerate()
            .map(|(i, &n)| ep(if i % 2 == 0 { Direction::In } else { Direction::Out }, n))
            .collect();
        dev.add(Function::new(1, eps), &NO_CONTEXT, None, None)
            .unwrap();
    }
    dev.begin().unwrap();

    let layout = dev.layout().unwrap();
    assert_eq!(layout.num_endpoints(), 8);
    let eps = layout.endpoints();
    for (i, e) in eps.iter().enumerate() {
        assert_eq!(e.address as usize, i + 1);
    }
    for pair in eps.windows(2) {
        assert!(pair[0].buffer_offset + pair[0].buffer_size <= pair[1].buffer_offset);
    }
    assert!(layout.buffer_end() <= PMA_MEMORY_SIZE);
}

#[test]
fn each_bound_alone_fails_layout() {
    // Endpoints.
    let mut dev = device();
    let eps = (0..MAX_ENDPOINTS).map(|_| ep(Direction::In, 8)).collect();
    dev.add(Function::new(1, eps), &NO_CONTEXT, None, None)
        .unwrap();
    assert_eq!(dev.begin(), Err(Error::TooManyEndpoints));

    // Descriptor bytes: 23 interfaces * 9 bytes > 200.
    let mut dev = device();
    let interfaces = (MAX_DESCRIPTOR_DATA_SIZE / INTERFACE_DESCRIPTOR_SIZE + 1) as u8;
    dev.add(Function::new(interfaces, vec![]), &NO_CONTEXT, None, None)
        .unwrap();
    assert_eq!(dev.begin(), Err(Error::DescriptorTooLarge));

    // Packet memory.
    let mut dev = device();
    let free = PMA_MEMORY_SIZE - PMA_PART_START;
    dev.add(
        Function::new(1, vec![ep(Direction::In, free), ep(Direction::Out, 1)]),
        &NO_CONTEXT,
        None,
        None,
    )
    .unwrap();
    assert_eq!(dev.begin(), Err(Error::BufferPoolExhausted));
    assert!(!dev.engine().enabled);
}

#[test]
fn reconfiguration_never_reaches_old_parts() {
    static TABLE: StaticCell<DispatchTable> = StaticCell::new();
    let table: &'static DispatchTable = TABLE.init(DispatchTable::new());
    let mut dev = CompositeDevice::new(RecordingEngine::default(), table);
    let old: Vec<&'static Function> = (0..3)
        .map(|_| Function::new(1, vec![ep(Direction::In, 8), ep(Direction::Out, 8)]))
        .collect();
    for part in &old {
        dev.add(*part, &NO_CONTEXT, None, None).unwrap();
    }
    dev.begin().unwrap();
    dev.end();
    dev.clear();

    let new = Function::new(1, vec![ep(Direction::Out, 8)]);
    dev.add(new, &NO_CONTEXT, None, None).unwrap();
    dev.begin().unwrap();

    // Fire every vector in both directions.
    for slot in 0..DISPATCH_SLOTS {
        for dir in [Direction::In, Direction::Out] {
            if let Some(owner) = table.owner(dir, slot) {
                assert!(same_part(owner, new));
            }
            table.dispatch(dir, slot);
        }
    }
    for part in &old {
        assert_eq!(part.events.load(Ordering::Relaxed), 0);
    }
    assert_eq!(new.events.load(Ordering::Relaxed), 1);
}

#[test]
fn default_manufacturer_reaches_engine() {
    let mut dev = device();
    dev.begin().unwrap();
    let m = &dev.engine().manufacturer;
    assert_eq!(m[0] as usize, m.len());
    assert_eq!(m[1], 0x03);
    assert_eq!(m[2], b'L');
}
