//! Well-known endpoint IDs for the destination and source header bytes.
//!
//! Endpoint IDs occupy the low 7 bits. Bit 7 of the destination byte is the
//! extended-payload flag and never part of an address.

/// The host PC.
pub const HOST: u8 = 0x01;

/// Rack controller, motherboard in a card-slot system.
pub const RACK: u8 = 0x11;

/// First bay in a card-slot system.
pub const BAY_0: u8 = 0x21;

/// Last bay in a card-slot system.
pub const BAY_9: u8 = 0x2A;

/// Generic USB hardware unit.
pub const GENERIC_USB: u8 = 0x50;

/// Destination used when the caller does not supply one.
pub const DEFAULT_DESTINATION: u8 = GENERIC_USB;

/// Source used when the caller does not supply one.
pub const DEFAULT_SOURCE: u8 = HOST;

/// Destination-byte flag marking a long frame.
pub const EXTENDED_FLAG: u8 = 0x80;

/// Returns a human-readable name for an endpoint ID.
pub fn endpoint_name(id: u8) -> &'static str {
    match id & !EXTENDED_FLAG {
        HOST => "HOST",
        RACK => "RACK",
        BAY_0..=BAY_9 => "BAY",
        GENERIC_USB => "GENERIC_USB",
        _ => "UNKNOWN",
    }
}

/// Returns the bay index (0-9) for a bay endpoint.
pub fn bay_index(id: u8) -> Option<u8> {
    match id & !EXTENDED_FLAG {
        id @ BAY_0..=BAY_9 => Some(id - BAY_0),
        _ => None,
    }
}

/// Returns true if the destination byte announces an extended payload.
pub fn is_extended(destination: u8) -> bool {
    destination & EXTENDED_FLAG != 0
}
