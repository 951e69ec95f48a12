//! Errors reported while configuring the pointing pipeline

/// Configuration and storage errors.
///
/// Nothing in the per-tick path returns these: out of range values met while
/// running are clamped instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Scroll thresholds must be strictly positive
    InvalidScrollThreshold(i16),
    /// The stored settings blob failed its CRC check
    Checksum { expected: u16, found: u16 },
    /// The stored settings blob belongs to another record
    BadMagic(u8),
    /// No motion mapping for this Keyball model number
    UnknownBoardModel(u8),
}
