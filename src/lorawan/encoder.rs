//! DevAddr encoder
//!
//! Builds a DevAddr from the NetID of the allocating network and the
//! network-assigned NwkAddr. This is the inverse of [`super::netid::decode`].
//!
//! Address structure for type `t`:
//!   t × `1` | `0` | NwkID (width(t) bits) | NwkAddr (31 - t - width(t) bits)

use thiserror::Error;

use super::{low_mask, DevAddr, NetId, ADDR_TYPE_NWKID_BITS};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    /// The NetID has bits set between its type and its NwkID field
    #[error("NetID {net_id} does not fit a type {addr_type} DevAddr ({width} NwkID bits)")]
    NwkIdOutOfRange {
        net_id: NetId,
        addr_type: u8,
        width: u32,
    },

    #[error("NwkAddr 0x{nwk_addr:X} exceeds the {bits} bits available for NetID {net_id}")]
    NwkAddrOutOfRange {
        net_id: NetId,
        nwk_addr: u32,
        bits: u32,
    },
}

/// Parameters for building a DevAddr
#[derive(Debug, Clone, Copy)]
pub struct AddrBuilder {
    /// NetID of the network allocating the address
    pub net_id: NetId,
    /// Device part of the address, assigned by the network
    pub nwk_addr: u32,
}

impl AddrBuilder {
    pub fn new(net_id: NetId, nwk_addr: u32) -> Self {
        Self { net_id, nwk_addr }
    }

    /// Number of NwkAddr bits a DevAddr of this NetID carries
    pub fn nwk_addr_bits(&self) -> u32 {
        let addr_type = self.net_id.addr_type() as u32;
        31 - addr_type - ADDR_TYPE_NWKID_BITS[addr_type as usize]
    }

    pub fn build(&self) -> Result<DevAddr, EncodeError> {
        let addr_type = self.net_id.addr_type();
        let width = ADDR_TYPE_NWKID_BITS[addr_type as usize];
        let nwk_id = self.net_id.nwk_id();

        // Bits 21-width .. 21 of the NetID have no place in the DevAddr
        if nwk_id | ((addr_type as u32) << 21) != self.net_id.value() {
            return Err(EncodeError::NwkIdOutOfRange {
                net_id: self.net_id,
                addr_type,
                width,
            });
        }

        let bits = self.nwk_addr_bits();
        if self.nwk_addr > low_mask(bits) {
            return Err(EncodeError::NwkAddrOutOfRange {
                net_id: self.net_id,
                nwk_addr: self.nwk_addr,
                bits,
            });
        }

        // Type prefix: addr_type ones, then the terminating zero at bit 31 - addr_type
        let prefix = u32::MAX.checked_shl(32 - addr_type as u32).unwrap_or(0);

        Ok(DevAddr::new(prefix | (nwk_id << bits) | self.nwk_addr))
    }
}

impl DevAddr {
    /// Build the DevAddr for `nwk_addr` inside the block of `net_id`
    pub fn from_net_id(net_id: NetId, nwk_addr: u32) -> Result<Self, EncodeError> {
        AddrBuilder::new(net_id, nwk_addr).build()
    }

    /// First and last DevAddr of the block allocated to `net_id`
    pub fn range(net_id: NetId) -> Result<(Self, Self), EncodeError> {
        let builder = AddrBuilder::new(net_id, 0);
        let last = low_mask(builder.nwk_addr_bits());
        Ok((builder.build()?, Self::from_net_id(net_id, last)?))
    }
}
