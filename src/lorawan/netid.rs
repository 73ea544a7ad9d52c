//! DevAddr → NetID decoding
//!
//! A DevAddr starts with a unary-coded address type: `t` bits set to `1`
//! followed by a `0`. The type selects how many of the following bits form
//! the NwkID (see [`ADDR_TYPE_NWKID_BITS`](super::ADDR_TYPE_NWKID_BITS)),
//! and the NetID is the NwkID with the type packed into its top 3 bits:
//!
//! ```text
//!   DevAddr:  1..1 0 | NwkID (width(t) bits) | NwkAddr
//!   NetID:    t (3 bits) | 0..0 | NwkID
//! ```
//!
//! Reference: LoRaWAN Backend Interfaces 1.0, section 13

use std::fmt;

use serde::{Serialize, Serializer};
use thiserror::Error;

use super::{DevAddr, NetId};

/// Why a DevAddr string produced no NetID
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Not hexadecimal, or wider than the target type
    #[error("malformed DevAddr {input:?}: {reason}")]
    MalformedInput { input: String, reason: String },

    /// Parses, but the type prefix names no address class
    ///
    /// `leading_ones` is `None` for an empty DevAddr (device never joined).
    #[error("{}", describe_class(.leading_ones))]
    InvalidAddressClass { leading_ones: Option<u32> },
}

fn describe_class(leading_ones: &Option<u32>) -> String {
    match leading_ones {
        Some(n) => format!("DevAddr has {} leading one bits, no address type class", n),
        None => "empty DevAddr, no address type class".to_string(),
    }
}

pub type DecodeResult = Result<NetId, DecodeError>;

/// Decode a hex DevAddr into the NetID it was allocated from
///
/// An empty string yields [`DecodeError::InvalidAddressClass`] rather than
/// a parse error, since unactivated devices report no DevAddr at all.
pub fn decode(dev_addr: &str) -> DecodeResult {
    if dev_addr.is_empty() {
        return Err(DecodeError::InvalidAddressClass { leading_ones: None });
    }

    let addr: DevAddr = dev_addr.parse()?;
    addr.net_id().ok_or(DecodeError::InvalidAddressClass {
        leading_ones: Some(addr.value().leading_ones()),
    })
}

/// Decode and fold both failure kinds into [`NetIdBucket::Invalid`]
pub fn classify(dev_addr: &str) -> NetIdBucket {
    decode(dev_addr).into()
}

/// Aggregation key for per-network statistics
///
/// Sorts by NetID with `Invalid` after every real network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NetIdBucket {
    NetId(NetId),
    Invalid,
}

impl Serialize for NetIdBucket {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl From<DecodeResult> for NetIdBucket {
    fn from(result: DecodeResult) -> Self {
        match result {
            Ok(net_id) => NetIdBucket::NetId(net_id),
            Err(_) => NetIdBucket::Invalid,
        }
    }
}

impl fmt::Display for NetIdBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetIdBucket::NetId(net_id) => write!(f, "{}", net_id),
            NetIdBucket::Invalid => write!(f, "Invalid"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lorawan::ADDR_TYPE_NWKID_BITS;

    fn net_id(s: &str) -> String {
        decode(s).expect("should decode").to_string()
    }

    #[test]
    fn test_empty_is_invalid_class() {
        assert_eq!(
            decode(""),
            Err(DecodeError::InvalidAddressClass { leading_ones: None })
        );
        assert_eq!(classify(""), NetIdBucket::Invalid);
    }

    #[test]
    fn test_all_zero_address() {
        assert_eq!(net_id("00000000"), "000000");
    }

    #[test]
    fn test_all_ones_is_invalid() {
        assert_eq!(
            decode("FFFFFFFF"),
            Err(DecodeError::InvalidAddressClass { leading_ones: Some(32) })
        );
        assert_eq!(
            decode("FF123456"),
            Err(DecodeError::InvalidAddressClass { leading_ones: Some(8) })
        );
    }

    #[test]
    fn test_known_networks() {
        // The Things Network
        assert_eq!(net_id("260B1234"), "000013");
        // Helium, type 0 block
        assert_eq!(net_id("48000ABC"), "000024");
        // Helium, type 3 block
        assert_eq!(net_id("E05A0000"), "60002D");
    }

    #[test]
    fn test_each_class_boundary() {
        // Smallest address of every class decodes to NwkID 0
        for t in 0..8u32 {
            let addr = u32::MAX.checked_shl(32 - t).unwrap_or(0);
            let decoded = decode(&format!("{:08X}", addr)).unwrap();
            assert_eq!(decoded.value(), t << 21, "class {}", t);
        }
    }

    #[test]
    fn test_class_7_width() {
        assert_eq!(ADDR_TYPE_NWKID_BITS[7], 17);
        // 1111_1110 | 1010_1010 1010_1010 1 | 111_1111
        assert_eq!(net_id("FEAAAAFF"), "E15555");
        assert_eq!(net_id("FEAAAA80"), "E15555");
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(decode("0a1b2c3d"), decode("0A1B2C3D"));
        assert_eq!(net_id("0a1b2c3d"), "000005");
    }

    #[test]
    fn test_malformed_input() {
        for input in ["xyz", "12-34", " 260B1234", "-1", "100000000"] {
            match decode(input) {
                Err(DecodeError::MalformedInput { input: got, .. }) => assert_eq!(got, input),
                other => panic!("{:?}: expected MalformedInput, got {:?}", input, other),
            }
            assert_eq!(classify(input), NetIdBucket::Invalid);
        }
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        // "1" is 0x00000001: class 0, NwkID 0
        assert_eq!(net_id("1"), "000000");
    }

    #[test]
    fn test_decode_is_deterministic() {
        for input in ["", "260B1234", "FFFFFFFF", "nope"] {
            assert_eq!(decode(input), decode(input));
        }
    }

    #[test]
    fn test_bucket_order_and_display() {
        let mut buckets = vec![
            NetIdBucket::Invalid,
            classify("E05A0000"),
            classify("260B1234"),
        ];
        buckets.sort();
        let rendered: Vec<String> = buckets.iter().map(|b| b.to_string()).collect();
        assert_eq!(rendered, vec!["000013", "60002D", "Invalid"]);
    }

    #[test]
    fn test_error_messages() {
        let err = decode("FFFFFFFF").unwrap_err();
        assert_eq!(
            err.to_string(),
            "DevAddr has 32 leading one bits, no address type class"
        );
        let err = decode("zz").unwrap_err();
        assert_eq!(err.to_string(), "malformed DevAddr \"zz\": not a hexadecimal number");
    }
}
