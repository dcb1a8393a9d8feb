//! Unified error type for the composition layer.
//!
//! Every failure is a static bound check against a fixed hardware limit,
//! so variants carry only fixed-size data and the enum stays `Copy`.

/// Top-level error type returned by registration, layout and activation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    // Registry
    /// All part slots are already in use.
    RegistryFull,

    // Layout
    /// The parts need more endpoints than the peripheral provides.
    TooManyEndpoints,

    /// The running interface number no longer fits in a `u8`.
    TooManyInterfaces,

    /// The part descriptors do not fit in the configuration buffer.
    DescriptorTooLarge,

    /// Packet memory cannot hold the requested endpoint buffers.
    BufferPoolExhausted,

    // Lifecycle
    /// The init hook of the part at `index` reported failure.
    InitFailed { index: usize },
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Error::RegistryFull => f.write_str("part registry is full"),
            Error::TooManyEndpoints => f.write_str("endpoint limit exceeded"),
            Error::TooManyInterfaces => f.write_str("interface limit exceeded"),
            Error::DescriptorTooLarge => f.write_str("configuration descriptor too large"),
            Error::BufferPoolExhausted => f.write_str("packet memory exhausted"),
            Error::InitFailed { index } => write!(f, "init hook of part {} failed", index),
        }
    }
}
