//! Fixed-capacity registry of parts and their lifecycle hooks.

use core::any::Any;

use heapless::Vec;

use crate::config::MAX_PARTS;
use crate::error::Error;
use crate::part::{same_part, UsbPart};

/// Opaque state handed to a part's hooks, usually the class driver that
/// owns the part.
pub type PartContext = &'static (dyn Any + Sync);

/// Runs before activation.  Returning `false` aborts activation.
pub type InitHook = fn(PartContext) -> bool;

/// Runs after deactivation.
pub type StopHook = fn(PartContext);

/// One registered part.
#[derive(Clone, Copy)]
pub struct PartEntry {
    pub part: &'static dyn UsbPart,
    pub context: PartContext,
    pub init: Option<InitHook>,
    pub stop: Option<StopHook>,
}

impl PartEntry {
    fn matches(&self, part: &dyn UsbPart, context: PartContext) -> bool {
        same_part(self.part, part)
            && core::ptr::addr_eq(
                self.context as *const (dyn Any + Sync),
                context as *const (dyn Any + Sync),
            )
    }
}

/// Ordered list of up to [`MAX_PARTS`] parts.
#[derive(Default)]
pub struct PartRegistry {
    entries: Vec<PartEntry, MAX_PARTS>,
}

impl PartRegistry {
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register `part` with `context`.
    ///
    /// Adding a (part, context) pair that is already registered replaces
    /// its hooks in place and keeps its position.  Fails without touching
    /// the registry when every slot is taken.
    pub fn add(
        &mut self,
        part: &'static dyn UsbPart,
        context: PartContext,
        init: Option<InitHook>,
        stop: Option<StopHook>,
    ) -> Result<(), Error> {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.matches(part, context)) {
            entry.init = init;
            entry.stop = stop;
            return Ok(());
        }

        self.entries
            .push(PartEntry {
                part,
                context,
                init,
                stop,
            })
            .map_err(|_| {
                warn!("part registry full ({} parts)", MAX_PARTS);
                Error::RegistryFull
            })
    }

    /// Forget every registered part.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[PartEntry] {
        &self.entries
    }

    /// Parts in registration order.
    pub fn parts(&self) -> impl Iterator<Item = &'static dyn UsbPart> + '_ {
        self.entries.iter().map(|e| e.part)
    }
}
