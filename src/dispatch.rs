//! Endpoint callback dispatch.
//!
//! Endpoint interrupt vectors are plain `fn()` pointers fixed at build
//! time, so they cannot capture which part owns an endpoint in the
//! current configuration.  Instead there is one trampoline per
//! (direction, slot); each looks its slot up in a [`DispatchTable`] and
//! runs the stored handler on the stored part.  An empty slot does
//! nothing.
//!
//! The table is the only state shared between foreground code and
//! interrupt context.  It is rewritten as a whole inside one critical
//! section, so a trampoline never sees a half-built table.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;

use crate::config::DISPATCH_SLOTS;
use crate::layout::Layout;
use crate::part::{Direction, HandlerId, UsbPart};

/// Handler bound to an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Handler {
    /// Installed for endpoints that did not ask for a handler.
    Nop,
    /// Forwarded to [`UsbPart::endpoint_event`].
    Part(HandlerId),
}

#[derive(Clone, Copy)]
struct Slot {
    part: &'static dyn UsbPart,
    handler: Handler,
}

struct Slots {
    tx: [Option<Slot>; DISPATCH_SLOTS],
    rx: [Option<Slot>; DISPATCH_SLOTS],
}

impl Slots {
    const EMPTY: Self = Self {
        tx: [None; DISPATCH_SLOTS],
        rx: [None; DISPATCH_SLOTS],
    };

    fn side(&mut self, direction: Direction) -> &mut [Option<Slot>; DISPATCH_SLOTS] {
        match direction {
            Direction::In => &mut self.tx,
            Direction::Out => &mut self.rx,
        }
    }
}

/// (part, handler) pairs indexed by endpoint slot and direction.
/// Endpoint number `n` is served by slot `n - 1`.
pub struct DispatchTable {
    slots: Mutex<CriticalSectionRawMutex, RefCell<Slots>>,
}

impl Default for DispatchTable {
    fn default() -> Self {
        Self::new()
    }
}

impl DispatchTable {
    pub const fn new() -> Self {
        Self {
            slots: Mutex::new(RefCell::new(Slots::EMPTY)),
        }
    }

    /// Empty every slot.
    pub fn clear(&self) {
        self.slots.lock(|slots| *slots.borrow_mut() = Slots::EMPTY);
    }

    /// Replace the whole table with the endpoints of `layout`.
    ///
    /// `parts` must be the part list `layout` was planned from.  Slots not
    /// covered by the layout end up empty.
    pub fn install(&self, parts: &[&'static dyn UsbPart], layout: &Layout) {
        self.slots.lock(|slots| {
            let mut slots = slots.borrow_mut();
            *slots = Slots::EMPTY;
            for ep in layout.endpoints() {
                let Some(&part) = parts.get(ep.part) else {
                    continue;
                };
                if let Some(slot) = slots.side(ep.direction).get_mut(ep.slot()) {
                    *slot = Some(Slot {
                        part,
                        handler: ep.handler,
                    });
                }
            }
        });
        debug!("dispatch: {} endpoint slots bound", layout.endpoints().len());
    }

    /// Run the handler bound to `slot`, if any.  Called from interrupt
    /// context by the trampolines.
    pub fn dispatch(&self, direction: Direction, slot: usize) {
        let entry = self
            .slots
            .lock(|slots| slots.borrow_mut().side(direction).get(slot).copied().flatten());
        if let Some(Slot {
            part,
            handler: Handler::Part(id),
        }) = entry
        {
            part.endpoint_event(id);
        }
    }

    /// Part bound to `slot`, if any.
    pub fn owner(&self, direction: Direction, slot: usize) -> Option<&'static dyn UsbPart> {
        self.slots.lock(|slots| {
            slots
                .borrow_mut()
                .side(direction)
                .get(slot)
                .and_then(|s| s.map(|s| s.part))
        })
    }

    /// Handler bound to `slot`, if any.
    pub fn handler(&self, direction: Direction, slot: usize) -> Option<Handler> {
        self.slots.lock(|slots| {
            slots
                .borrow_mut()
                .side(direction)
                .get(slot)
                .and_then(|s| s.map(|s| s.handler))
        })
    }

    /// Number of occupied slots across both directions.
    pub fn occupied(&self) -> usize {
        self.slots.lock(|slots| {
            let slots = slots.borrow();
            slots.tx.iter().chain(slots.rx.iter()).filter(|s| s.is_some()).count()
        })
    }
}

/// Table served by the trampolines below.
pub static DISPATCH: DispatchTable = DispatchTable::new();

macro_rules! trampolines {
    ($dir:expr; $($name:ident => $slot:literal),* $(,)?) => {
        $(
            #[doc = concat!("Endpoint vector for slot ", stringify!($slot), ".")]
            pub fn $name() {
                DISPATCH.dispatch($dir, $slot);
            }
        )*
    };
}

trampolines!(Direction::In;
    ep_in_0 => 0, ep_in_1 => 1, ep_in_2 => 2, ep_in_3 => 3,
    ep_in_4 => 4, ep_in_5 => 5, ep_in_6 => 6,
);

trampolines!(Direction::Out;
    ep_out_0 => 0, ep_out_1 => 1, ep_out_2 => 2, ep_out_3 => 3,
    ep_out_4 => 4, ep_out_5 => 5, ep_out_6 => 6,
);

/// IN (TX complete) vectors, indexed by slot.
pub static EP_IN_TRAMPOLINES: [fn(); DISPATCH_SLOTS] = [
    ep_in_0, ep_in_1, ep_in_2, ep_in_3, ep_in_4, ep_in_5, ep_in_6,
];

/// OUT (RX complete) vectors, indexed by slot.
pub static EP_OUT_TRAMPOLINES: [fn(); DISPATCH_SLOTS] = [
    ep_out_0, ep_out_1, ep_out_2, ep_out_3, ep_out_4, ep_out_5, ep_out_6,
];
