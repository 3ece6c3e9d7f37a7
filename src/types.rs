//! Core types used throughout linkagg.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// IP protocols the simulator understands.
///
/// The discriminants are the IANA protocol numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Protocol {
    /// Internet Control Message Protocol
    Icmp = 1,
    /// Transmission Control Protocol
    Tcp = 6,
    /// User Datagram Protocol
    Udp = 17,
    /// OSPF, multicast routing control traffic
    Ospf = 89,
}

impl Protocol {
    /// All supported protocols, in protocol-number order.
    pub const ALL: [Protocol; 4] = [Self::Icmp, Self::Tcp, Self::Udp, Self::Ospf];

    /// IANA protocol number.
    pub fn number(self) -> u8 {
        self as u8
    }

    /// Whether frames of this protocol carry transport ports.
    pub fn has_ports(self) -> bool {
        matches!(self, Self::Tcp | Self::Udp)
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Icmp => "ICMP",
            Self::Tcp => "TCP",
            Self::Udp => "UDP",
            Self::Ospf => "OSPF",
        }
    }
}

impl TryFrom<u8> for Protocol {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self> {
        match number {
            1 => Ok(Self::Icmp),
            6 => Ok(Self::Tcp),
            17 => Ok(Self::Udp),
            89 => Ok(Self::Ospf),
            other => Err(Error::UnsupportedProtocol(other)),
        }
    }
}

impl FromStr for Protocol {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "icmp" => Ok(Self::Icmp),
            "tcp" => Ok(Self::Tcp),
            "udp" => Ok(Self::Udp),
            "ospf" => Ok(Self::Ospf),
            other => other
                .parse::<u8>()
                .map_err(|_| Error::Config(format!("unknown protocol: {other}")))
                .and_then(Self::try_from),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// 48-bit Ethernet MAC address.
///
/// Stored in the low 48 bits of a `u64`; the upper 16 bits are always zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct MacAddr(u64);

impl MacAddr {
    const MASK: u64 = 0xffff_ffff_ffff;

    /// The IPv4 multicast MAC for OSPF AllSPFRouters (224.0.0.5).
    pub const ALL_SPF_ROUTERS: Self = Self(0x0100_5e00_0005);

    pub fn new(octets: [u8; 6]) -> Self {
        let mut raw = [0u8; 8];
        raw[2..].copy_from_slice(&octets);
        Self(u64::from_be_bytes(raw))
    }

    /// Build from an integer, keeping only the low 48 bits.
    pub fn from_u64(value: u64) -> Self {
        Self(value & Self::MASK)
    }

    pub fn to_u64(self) -> u64 {
        self.0
    }

    pub fn octets(self) -> [u8; 6] {
        let raw = self.0.to_be_bytes();
        [raw[2], raw[3], raw[4], raw[5], raw[6], raw[7]]
    }

    pub fn is_multicast(self) -> bool {
        self.octets()[0] & 0x01 == 0x01
    }
}

impl fmt::Display for MacAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:012x}", self.0)
    }
}

impl FromStr for MacAddr {
    type Err = Error;

    /// Accepts `001122aabbcc`, `00:11:22:aa:bb:cc` and `00-11-22-aa-bb-cc`.
    fn from_str(s: &str) -> Result<Self> {
        let digits: String = s.chars().filter(|c| !matches!(c, ':' | '-')).collect();
        if digits.len() != 12 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidMacAddress(s.to_string()));
        }
        u64::from_str_radix(&digits, 16)
            .map(Self)
            .map_err(|_| Error::InvalidMacAddress(s.to_string()))
    }
}

impl Serialize for MacAddr {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for MacAddr {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Bounded flow signature produced by the hash selector.
///
/// The signature space is `[0, 255]`; the backing `u8` makes any other value
/// unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlowSignature(pub u8);

impl FlowSignature {
    pub const MIN: Self = Self(u8::MIN);
    pub const MAX: Self = Self(u8::MAX);

    /// Number of distinct signatures.
    pub const SPACE: u32 = 256;

    pub fn value(self) -> u8 {
        self.0
    }

    /// Iterate over the whole signature space in ascending order.
    pub fn all() -> impl Iterator<Item = Self> {
        (u8::MIN..=u8::MAX).map(Self)
    }
}

impl fmt::Display for FlowSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 1-based index of an active egress link in a bundle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkIndex(pub u16);

impl LinkIndex {
    pub fn get(self) -> u16 {
        self.0
    }

    /// Zero-based slot, for indexing per-link tables.
    pub fn slot(self) -> usize {
        usize::from(self.0).saturating_sub(1)
    }
}

impl fmt::Display for LinkIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protocol_numbers() {
        assert_eq!(Protocol::Icmp.number(), 1);
        assert_eq!(Protocol::Tcp.number(), 6);
        assert_eq!(Protocol::Udp.number(), 17);
        assert_eq!(Protocol::Ospf.number(), 89);

        for proto in Protocol::ALL {
            assert_eq!(Protocol::try_from(proto.number()).unwrap(), proto);
        }
    }

    #[test]
    fn test_unknown_protocol_rejected() {
        assert!(matches!(
            Protocol::try_from(47),
            Err(Error::UnsupportedProtocol(47))
        ));
        assert!(matches!(
            "132".parse::<Protocol>(),
            Err(Error::UnsupportedProtocol(132))
        ));
        assert!("sctp".parse::<Protocol>().is_err());
    }

    #[test]
    fn test_protocol_from_str() {
        assert_eq!("TCP".parse::<Protocol>().unwrap(), Protocol::Tcp);
        assert_eq!("ospf".parse::<Protocol>().unwrap(), Protocol::Ospf);
        assert_eq!("17".parse::<Protocol>().unwrap(), Protocol::Udp);
    }

    #[test]
    fn test_mac_formats() {
        let mac: MacAddr = "00:11:22:aa:bb:cc".parse().unwrap();
        assert_eq!(mac.to_string(), "001122aabbcc");
        assert_eq!(mac, "001122aabbcc".parse().unwrap());
        assert_eq!(mac, MacAddr::new([0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]));
        assert_eq!(mac.octets(), [0x00, 0x11, 0x22, 0xaa, 0xbb, 0xcc]);
    }

    #[test]
    fn test_mac_rejects_garbage() {
        assert!("0011".parse::<MacAddr>().is_err());
        assert!("zz1122aabbcc".parse::<MacAddr>().is_err());
        assert!("00112233445566".parse::<MacAddr>().is_err());
        assert!("+0112233aabb".parse::<MacAddr>().is_err());
        assert!("+0:11:22:33:aa:bb".parse::<MacAddr>().is_err());
    }

    #[test]
    fn test_mac_masks_high_bits() {
        let mac = MacAddr::from_u64(u64::MAX);
        assert_eq!(mac.to_u64(), 0xffff_ffff_ffff);
    }

    #[test]
    fn test_all_spf_routers_is_multicast() {
        assert_eq!(MacAddr::ALL_SPF_ROUTERS.to_string(), "01005e000005");
        assert!(MacAddr::ALL_SPF_ROUTERS.is_multicast());
    }

    #[test]
    fn test_link_index_slot() {
        assert_eq!(LinkIndex(1).slot(), 0);
        assert_eq!(LinkIndex(64).slot(), 63);
    }

    #[test]
    fn test_signature_space() {
        assert_eq!(FlowSignature::all().count() as u32, FlowSignature::SPACE);
    }
}
