pub mod encoder;
pub mod netid;

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

pub use encoder::{AddrBuilder, EncodeError};
pub use netid::{classify, decode, DecodeError, DecodeResult, NetIdBucket};

/// NwkID field width (in bits) for each DevAddr address type class
///
/// Indexed by the number of leading `1` bits in the DevAddr (0..=7).
/// Types with a shorter prefix carry fewer NetIDs but more NwkAddr bits.
pub const ADDR_TYPE_NWKID_BITS: [u32; 8] = [6, 6, 9, 11, 12, 13, 15, 17];

/// Number of address type classes defined by LoRaWAN Backend Interfaces
pub const ADDR_TYPE_COUNT: u32 = ADDR_TYPE_NWKID_BITS.len() as u32;

/// NetID bits above the NwkID field hold the address type
const NET_ID_TYPE_SHIFT: u32 = 21;

/// Largest value a 24-bit NetID can take
pub const NET_ID_MAX: u32 = 0x00FF_FFFF;

/// Mask covering the `bits` least significant bits
pub(crate) fn low_mask(bits: u32) -> u32 {
    u32::MAX.checked_shr(32 - bits).unwrap_or(0)
}

/// LoRaWAN device address (DevAddr), 32 bits
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DevAddr(u32);

impl DevAddr {
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    /// Address type class, i.e. the number of leading `1` bits
    ///
    /// `None` when the first 8 bits are all set: no class is defined there.
    pub fn addr_type(self) -> Option<u8> {
        let ones = self.0.leading_ones();
        (ones < ADDR_TYPE_COUNT).then_some(ones as u8)
    }

    /// Width of the NwkAddr field left after the type prefix and the NwkID
    fn nwk_addr_bits(addr_type: u8) -> u32 {
        32 - (addr_type as u32 + 1) - ADDR_TYPE_NWKID_BITS[addr_type as usize]
    }

    /// NwkID bits that follow the type prefix's terminating `0`
    pub fn nwk_id(self) -> Option<u32> {
        let addr_type = self.addr_type()?;
        let width = ADDR_TYPE_NWKID_BITS[addr_type as usize];
        Some((self.0 >> Self::nwk_addr_bits(addr_type)) & low_mask(width))
    }

    /// Network-assigned bits below the NwkID field
    pub fn nwk_addr(self) -> Option<u32> {
        let addr_type = self.addr_type()?;
        Some(self.0 & low_mask(Self::nwk_addr_bits(addr_type)))
    }

    /// NetID of the network that assigned this address
    pub fn net_id(self) -> Option<NetId> {
        let addr_type = self.addr_type()?;
        let nwk_id = self.nwk_id()?;
        Some(NetId(((addr_type as u32) << NET_ID_TYPE_SHIFT) | nwk_id))
    }
}

impl From<u32> for DevAddr {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl FromStr for DevAddr {
    type Err = DecodeError;

    /// Parse a hex DevAddr (case-insensitive, optional `0x` prefix)
    ///
    /// The empty string is not an address; callers that want to treat it as
    /// an unactivated device should use [`decode`] instead.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s, 32).map(Self)
    }
}

impl fmt::Display for DevAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08X}", self.0)
    }
}

impl Serialize for DevAddr {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// LoRaWAN network identifier (NetID), 24 bits
///
/// The top 3 bits carry the address type so NetIDs of different types
/// never collide; the low bits carry the NwkID found in DevAddrs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NetId(u32);

impl NetId {
    pub fn new(value: u32) -> Option<Self> {
        (value <= NET_ID_MAX).then_some(Self(value))
    }

    pub const fn value(self) -> u32 {
        self.0
    }

    pub fn addr_type(self) -> u8 {
        (self.0 >> NET_ID_TYPE_SHIFT) as u8
    }

    /// NwkID field as stored in a DevAddr of this NetID's type
    pub fn nwk_id(self) -> u32 {
        self.0 & low_mask(ADDR_TYPE_NWKID_BITS[self.addr_type() as usize])
    }
}

impl TryFrom<u32> for NetId {
    type Error = anyhow::Error;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        NetId::new(value).ok_or_else(|| anyhow::anyhow!("NetID 0x{:X} exceeds 24 bits", value))
    }
}

impl FromStr for NetId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_hex(s, 24).map(Self)
    }
}

impl fmt::Display for NetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:06X}", self.0)
    }
}

impl Serialize for NetId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Parse an unsigned hex value that must fit in `bits` bits
fn parse_hex(s: &str, bits: u32) -> Result<u32, DecodeError> {
    let malformed = |reason: &str| DecodeError::MalformedInput {
        input: s.to_string(),
        reason: reason.to_string(),
    };

    let digits = s
        .strip_prefix("0x")
        .or_else(|| s.strip_prefix("0X"))
        .unwrap_or(s);
    if digits.is_empty() {
        return Err(malformed("no hex digits"));
    }
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(malformed("not a hexadecimal number"));
    }

    let too_wide = || malformed(&format!("exceeds {} bits", bits));
    let significant = digits.trim_start_matches('0');
    if significant.len() > 8 {
        return Err(too_wide());
    }
    if significant.is_empty() {
        return Ok(0);
    }

    let value = u32::from_str_radix(significant, 16).map_err(|_| too_wide())?;
    if value > low_mask(bits) {
        return Err(too_wide());
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_addr_type_counts_leading_ones() {
        assert_eq!(DevAddr::new(0x0000_0000).addr_type(), Some(0));
        assert_eq!(DevAddr::new(0x8000_0000).addr_type(), Some(1));
        assert_eq!(DevAddr::new(0xE05A_0000).addr_type(), Some(3));
        assert_eq!(DevAddr::new(0xFE00_0000).addr_type(), Some(7));
        assert_eq!(DevAddr::new(0xFF00_0000).addr_type(), None);
        assert_eq!(DevAddr::new(0xFFFF_FFFF).addr_type(), None);
    }

    #[test]
    fn test_fields_of_ttn_address() {
        // 0x26 = 0b0010_0110: type 0, NwkID 0b010011
        let addr = DevAddr::new(0x260B_1234);
        assert_eq!(addr.nwk_id(), Some(0x13));
        assert_eq!(addr.nwk_addr(), Some(0x000B_1234));
        assert_eq!(addr.net_id().map(|n| n.to_string()), Some("000013".to_string()));
    }

    #[test]
    fn test_class_7_ignores_trailing_bits() {
        // 7 ones, a zero, 17 NwkID bits (all ones), 7 NwkAddr bits
        let addr = DevAddr::new(0xFEFF_FF80 | 0x7F);
        assert_eq!(addr.nwk_id(), Some(0x1FFFF));
        assert_eq!(addr.nwk_addr(), Some(0x7F));

        let other = DevAddr::new(0xFEFF_FF80);
        assert_eq!(addr.net_id(), other.net_id());
        assert_eq!(addr.net_id().map(NetId::value), Some(0xE1_FFFF));
    }

    #[test]
    fn test_dev_addr_display_is_padded_uppercase() {
        assert_eq!(DevAddr::new(0x00ab_cdef).to_string(), "00ABCDEF");
    }

    #[test]
    fn test_dev_addr_parse() {
        assert_eq!("260b1234".parse::<DevAddr>().unwrap(), DevAddr::new(0x260B_1234));
        assert_eq!("0x1".parse::<DevAddr>().unwrap(), DevAddr::new(1));
        assert_eq!("000000001".parse::<DevAddr>().unwrap(), DevAddr::new(1));
        assert!("".parse::<DevAddr>().is_err());
        assert!("0x".parse::<DevAddr>().is_err());
        assert!("+1".parse::<DevAddr>().is_err());
        assert!("12 34".parse::<DevAddr>().is_err());
        assert!("1FFFFFFFF".parse::<DevAddr>().is_err());
        assert!("FFFFFFFFFFFFFFFFFFFF".parse::<DevAddr>().is_err());
    }

    #[test]
    fn test_net_id_parse_and_fields() {
        let net_id: NetId = "60002d".parse().unwrap();
        assert_eq!(net_id.addr_type(), 3);
        assert_eq!(net_id.nwk_id(), 0x2D);
        assert_eq!(net_id.to_string(), "60002D");

        assert!("1000000".parse::<NetId>().is_err());
        assert!(NetId::try_from(0x0100_0000).is_err());
        assert_eq!(NetId::new(0x13).map(NetId::value), Some(0x13));
    }
}
