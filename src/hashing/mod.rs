//! Flow signature calculation.
//!
//! Reduces a [`FlowDescriptor`] to a [`FlowSignature`] in `[0, 255]`, picking
//! the reduction by protocol the way link-aggregation hardware does: L3/L4
//! fields when the frame has transport ports, L3 addresses otherwise. A
//! [`HashPolicy::Layer2`] bundle hashes MAC addresses for every frame.
//!
//! Every function here is pure: identical inputs always give identical
//! signatures, which is what keeps a flow pinned to one egress link.

use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::flow::FlowDescriptor;
use crate::types::{FlowSignature, MacAddr, Protocol};

/// Which header layers feed the flow signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashPolicy {
    /// Ports + addresses + protocol for TCP/UDP, addresses for ICMP/OSPF.
    #[default]
    Layer34,
    /// Source and destination MAC for every protocol.
    Layer2,
}

impl fmt::Display for HashPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Layer34 => write!(f, "layer34"),
            Self::Layer2 => write!(f, "layer2"),
        }
    }
}

impl FromStr for HashPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "layer34" | "layer3+4" | "l34" => Ok(Self::Layer34),
            "layer2" | "l2" => Ok(Self::Layer2),
            other => Err(Error::Config(format!("unknown hash policy: {other}"))),
        }
    }
}

/// Compute the flow signature with the default L3/L4 policy.
pub fn compute_signature(flow: &FlowDescriptor) -> FlowSignature {
    compute_signature_with(HashPolicy::Layer34, flow)
}

/// Compute the flow signature under an explicit hash policy.
pub fn compute_signature_with(policy: HashPolicy, flow: &FlowDescriptor) -> FlowSignature {
    match policy {
        HashPolicy::Layer2 => hash_src_dst_mac(flow.src_mac(), flow.dst_mac()),
        HashPolicy::Layer34 => match flow {
            FlowDescriptor::Icmp(_) | FlowDescriptor::Ospf(_) => {
                hash_src_dst_ip(flow.src_ip(), flow.dst_ip())
            }
            FlowDescriptor::Tcp(f) | FlowDescriptor::Udp(f) => hash_src_dst_port_proto(
                flow.src_ip(),
                flow.dst_ip(),
                f.src_port(),
                f.dst_port(),
                flow.protocol(),
            ),
        },
    }
}

/// Address hash: the low nibble of the source address followed by the low
/// nibble of the destination address.
pub fn hash_src_dst_ip(src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> FlowSignature {
    let src = u32::from(src_ip) & 0x0f;
    let dst = u32::from(dst_ip) & 0x0f;
    FlowSignature(((src << 4) | dst) as u8)
}

/// Port hash over both ports, both addresses and the protocol number.
///
/// The destination fields are rotated by a nibble before mixing so that a
/// flow and its reverse direction do not collapse onto the same signature.
pub fn hash_src_dst_port_proto(
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    src_port: u16,
    dst_port: u16,
    protocol: Protocol,
) -> FlowSignature {
    let ports = (u32::from(src_port) << 16) | u32::from(dst_port.rotate_left(4));
    let addrs = u32::from(src_ip) ^ u32::from(dst_ip).rotate_left(4);
    FlowSignature(fold_u32(ports ^ addrs ^ u32::from(protocol.number())))
}

/// MAC hash: source MAC mixed with the nibble-shifted destination MAC.
pub fn hash_src_dst_mac(src_mac: MacAddr, dst_mac: MacAddr) -> FlowSignature {
    FlowSignature(fold_u64(src_mac.to_u64() ^ (dst_mac.to_u64() << 4)))
}

/// XOR the bytes of a word together.
fn fold_u32(x: u32) -> u8 {
    let x = x ^ (x >> 16);
    (x ^ (x >> 8)) as u8
}

fn fold_u64(x: u64) -> u8 {
    fold_u32((x ^ (x >> 32)) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(s: &str) -> MacAddr {
        s.parse().unwrap()
    }

    fn tcp(src_port: u16, dst_port: u16) -> FlowDescriptor {
        FlowDescriptor::tcp(
            mac("e0a1183e26f8"),
            mac("e6d1d19b940c"),
            Ipv4Addr::new(192, 168, 1, 10),
            Ipv4Addr::new(10, 0, 0, 1),
            src_port,
            dst_port,
        )
        .unwrap()
    }

    #[test]
    fn test_address_hash_concatenates_nibbles() {
        let sig = hash_src_dst_ip(Ipv4Addr::new(10, 0, 0, 1), Ipv4Addr::new(10, 0, 0, 2));
        assert_eq!(sig, FlowSignature(0x12));

        let sig = hash_src_dst_ip(Ipv4Addr::new(192, 168, 1, 255), Ipv4Addr::new(8, 8, 8, 8));
        assert_eq!(sig, FlowSignature(0xf8));
    }

    #[test]
    fn test_port_hash_known_values() {
        assert_eq!(compute_signature(&tcp(49152, 443)), FlowSignature(190));
        assert_eq!(compute_signature(&tcp(49153, 443)), FlowSignature(191));
        // reverse direction
        assert_eq!(compute_signature(&tcp(443, 49152)), FlowSignature(99));
    }

    #[test]
    fn test_protocol_changes_port_hash() {
        let tcp = tcp(49152, 443);
        let udp = FlowDescriptor::udp(
            tcp.src_mac(),
            tcp.dst_mac(),
            tcp.src_ip(),
            tcp.dst_ip(),
            49152,
            443,
        )
        .unwrap();
        assert_eq!(compute_signature(&udp), FlowSignature(169));
        assert_ne!(compute_signature(&tcp), compute_signature(&udp));
    }

    #[test]
    fn test_icmp_ignores_macs_under_layer34() {
        let a = FlowDescriptor::icmp(
            mac("000000000001"),
            mac("000000000002"),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let b = FlowDescriptor::icmp(
            mac("aaaaaaaaaaaa"),
            mac("bbbbbbbbbbbb"),
            Ipv4Addr::new(10, 0, 0, 1),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        assert_eq!(compute_signature(&a), compute_signature(&b));
        assert_ne!(
            compute_signature_with(HashPolicy::Layer2, &a),
            compute_signature_with(HashPolicy::Layer2, &b)
        );
    }

    #[test]
    fn test_mac_hash_known_value() {
        let flow = FlowDescriptor::ospf_hello(mac("aabbcc000420"), Ipv4Addr::new(10, 3, 4, 4));
        assert_eq!(
            compute_signature_with(HashPolicy::Layer2, &flow),
            FlowSignature(92)
        );
        // 10.3.4.4 -> 224.0.0.5
        assert_eq!(compute_signature(&flow), FlowSignature(0x45));
    }

    #[test]
    fn test_signature_is_deterministic() {
        let flow = tcp(12878, 35191);
        let first = compute_signature(&flow);
        for _ in 0..100 {
            assert_eq!(compute_signature(&flow), first);
        }
    }

    #[test]
    fn test_hash_policy_parse() {
        assert_eq!("layer34".parse::<HashPolicy>().unwrap(), HashPolicy::Layer34);
        assert_eq!("L2".parse::<HashPolicy>().unwrap(), HashPolicy::Layer2);
        assert!("layer7".parse::<HashPolicy>().is_err());
        assert_eq!(HashPolicy::default(), HashPolicy::Layer34);
    }

    #[test]
    fn test_fold() {
        assert_eq!(fold_u32(0x1122_3344), 0x11 ^ 0x22 ^ 0x33 ^ 0x44);
        assert_eq!(fold_u64(0x0102_0304_0506), 0x01 ^ 0x02 ^ 0x03 ^ 0x04 ^ 0x05 ^ 0x06);
    }
}
