//! Host-to-wire byte order conversion.
//!
//! The device expects every multi-byte field in little-endian order. The
//! functions here return a value whose native in-memory layout is already
//! the wire layout, so `to_wire16(x).to_ne_bytes()` is what goes on the wire.

/// Byte order of the machine executing the conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum HostOrder {
    /// Least significant byte first.
    Little,
    /// Most significant byte first.
    Big,
}

impl HostOrder {
    /// Byte order of the current target.
    #[cfg(target_endian = "little")]
    pub const NATIVE: Self = Self::Little;
    /// Byte order of the current target.
    #[cfg(target_endian = "big")]
    pub const NATIVE: Self = Self::Big;

    /// Converts a host `u16` to its wire representation on a host of this order.
    pub const fn to_wire16(self, value: u16) -> u16 {
        match self {
            Self::Little => value,
            Self::Big => value.swap_bytes(),
        }
    }

    /// Converts a host `u32` to its wire representation on a host of this order.
    pub const fn to_wire32(self, value: u32) -> u32 {
        match self {
            Self::Little => value,
            Self::Big => value.swap_bytes(),
        }
    }
}

/// Converts `value` to the device's little-endian `u16` layout.
pub const fn to_wire16(value: u16) -> u16 {
    HostOrder::NATIVE.to_wire16(value)
}

/// Converts `value` to the device's little-endian `u32` layout.
pub const fn to_wire32(value: u32) -> u32 {
    HostOrder::NATIVE.to_wire32(value)
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn native_layout_is_little_endian() {
        assert_eq!(to_wire16(0xFF02).to_ne_bytes(), [0x02, 0xFF]);
        assert_eq!(to_wire32(0x0003_0D40).to_ne_bytes(), [0x40, 0x0D, 0x03, 0x00]);
    }

    #[test]
    fn big_endian_host_swaps() {
        assert_eq!(HostOrder::Big.to_wire16(0x1234), 0x3412);
        assert_eq!(HostOrder::Big.to_wire32(0x1234_5678), 0x7856_3412);
    }

    #[test]
    fn native_matches_std() {
        assert_eq!(to_wire16(0xBEEF), 0xBEEF_u16.to_le());
        assert_eq!(to_wire32(0xDEAD_BEEF), 0xDEAD_BEEF_u32.to_le());
    }

    proptest! {
        #[test]
        fn little_host_is_identity(v16 in any::<u16>(), v32 in any::<u32>()) {
            prop_assert_eq!(HostOrder::Little.to_wire16(v16), v16);
            prop_assert_eq!(HostOrder::Little.to_wire32(v32), v32);
        }

        #[test]
        fn big_host_swaps_bytes(v16 in any::<u16>(), v32 in any::<u32>()) {
            // A big-endian host stores the result MSB first; that layout must
            // read back as the little-endian encoding of the input.
            prop_assert_eq!(HostOrder::Big.to_wire16(v16).to_be_bytes(), v16.to_le_bytes());
            prop_assert_eq!(HostOrder::Big.to_wire32(v32).to_be_bytes(), v32.to_le_bytes());
        }
    }
}
