//! Composite device - registration, activation and deactivation.
//!
//! One `CompositeDevice` exists per USB peripheral.  The application
//! owns it and passes it where it is needed; it holds the engine, the
//! registered parts, the identity and, while active, the committed
//! layout and configuration descriptor.

use heapless::Vec;

use crate::assemble::ConfigurationDescriptor;
use crate::config::MAX_PARTS;
use crate::dispatch::DispatchTable;
use crate::engine::{self, EngineIdentity, EngineSetup, UsbEngine};
use crate::error::Error;
use crate::identity::DeviceIdentity;
use crate::layout::{self, Layout};
use crate::part::{SetupResult, UsbPart};
use crate::registry::{InitHook, PartContext, PartRegistry, StopHook};

type PartList = Vec<&'static dyn UsbPart, MAX_PARTS>;

pub struct CompositeDevice<E: UsbEngine> {
    engine: E,
    dispatch: &'static DispatchTable,
    registry: PartRegistry,
    identity: DeviceIdentity,
    config: ConfigurationDescriptor,
    layout: Option<Layout>,
    /// Parts of the active configuration, fixed at `begin`.
    active_parts: PartList,
    active: bool,
}

impl<E: UsbEngine> CompositeDevice<E> {
    /// Create an inactive device with no parts and the default identity.
    ///
    /// Endpoint interrupts are routed through `dispatch`; firmware that
    /// installs the trampolines passes [`crate::dispatch::DISPATCH`].
    pub fn new(engine: E, dispatch: &'static DispatchTable) -> Self {
        Self {
            engine,
            dispatch,
            registry: PartRegistry::new(),
            identity: DeviceIdentity::new(),
            config: ConfigurationDescriptor::new(),
            layout: None,
            active_parts: PartList::new(),
            active: false,
        }
    }

    /// Register a part.  See [`PartRegistry::add`].
    ///
    /// Takes effect at the next [`begin`](Self::begin).
    pub fn add(
        &mut self,
        part: &'static dyn UsbPart,
        context: PartContext,
        init: Option<InitHook>,
        stop: Option<StopHook>,
    ) -> Result<(), Error> {
        self.registry.add(part, context, init, stop)
    }

    /// Drop every registered part.  Does not change the activation state;
    /// an active configuration keeps serving its parts until [`end`](Self::end).
    pub fn clear(&mut self) {
        self.registry.clear();
    }

    /// Start the parts, lay them out and activate the engine.
    ///
    /// Does nothing if already active.  Init hooks run in registration
    /// order and the first one that fails aborts activation; parts that
    /// were already started are left running.  On a layout error nothing
    /// is pushed to the engine.
    pub fn begin(&mut self) -> Result<(), Error> {
        if self.active {
            return Ok(());
        }

        for (index, entry) in self.registry.entries().iter().enumerate() {
            if let Some(init) = entry.init {
                if !init(entry.context) {
                    warn!("part {}: init hook failed", index);
                    return Err(Error::InitFailed { index });
                }
            }
        }

        let parts: PartList = self.registry.parts().collect();
        let layout = layout::plan(parts.iter().copied())?;

        self.config.assemble(parts.iter().copied(), &layout);
        self.dispatch.install(&parts, &layout);

        self.engine
            .set_identity(&EngineIdentity::from(&self.identity));
        self.engine.load(&EngineSetup {
            parts: &parts,
            layout: &layout,
            configuration_descriptor: self.config.as_bytes(),
            dispatch: self.dispatch,
        });
        self.engine.enable();

        info!(
            "USB composite device active: {} parts, {} endpoints, {} bytes",
            parts.len(),
            layout.num_endpoints(),
            layout.total_length()
        );
        self.layout = Some(layout);
        self.active_parts = parts;
        self.active = true;
        Ok(())
    }

    /// Deactivate the engine and stop the parts.  Does nothing if inactive.
    pub fn end(&mut self) {
        if !self.active {
            return;
        }

        self.engine.disable();
        self.dispatch.clear();
        for entry in self.registry.entries() {
            if let Some(stop) = entry.stop {
                stop(entry.context);
            }
        }

        self.layout = None;
        self.active_parts.clear();
        self.config.reset();
        self.active = false;
        info!("USB composite device stopped");
    }

    /// Active, connected and configured by the host.
    pub fn is_ready(&self) -> bool {
        self.active && self.engine.is_connected() && self.engine.is_configured()
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn part_count(&self) -> usize {
        self.registry.len()
    }

    /// Layout committed by the last successful [`begin`](Self::begin).
    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    /// Configuration descriptor of the active configuration.
    pub fn configuration_descriptor(&self) -> Option<&[u8]> {
        self.layout.as_ref().map(|_| self.config.as_bytes())
    }

    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Identity changes take effect at the next [`begin`](Self::begin).
    pub fn identity_mut(&mut self) -> &mut DeviceIdentity {
        &mut self.identity
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    // Bus events, forwarded in order to the parts of the active
    // configuration.  Nothing is forwarded while inactive.

    pub fn usb_reset(&self) {
        engine::notify_reset(&self.active_parts);
    }

    pub fn usb_set_configuration(&self) {
        engine::notify_set_configuration(&self.active_parts);
    }

    pub fn usb_clear_feature(&self) {
        engine::notify_clear_feature(&self.active_parts);
    }

    pub fn control_data_setup(&self, request: u8) -> SetupResult {
        engine::data_setup(&self.active_parts, request)
    }

    pub fn control_no_data_setup(&self, request: u8) -> SetupResult {
        engine::no_data_setup(&self.active_parts, request)
    }
}
