//! Flow descriptors: the header fields a frame is hashed on.
//!
//! A [`FlowDescriptor`] is a tagged union over the four protocols the
//! simulator understands. Transport flows (TCP/UDP) always carry both ports;
//! address-only flows (ICMP/OSPF) cannot carry any, so a protocol/field
//! mismatch is unrepresentable once a descriptor exists.

mod generator;

pub use generator::{pick_elephants, FlowGenerator};

use std::fmt;
use std::net::Ipv4Addr;
use std::num::NonZeroU16;

use serde::{Deserialize, Serialize};

use crate::error::{DescriptorError, Error, Result};
use crate::types::{MacAddr, Protocol};

/// Header fields of a flow that carries transport ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransportFlow {
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
    src_port: NonZeroU16,
    dst_port: NonZeroU16,
}

impl TransportFlow {
    pub fn new(
        src_mac: MacAddr,
        dst_mac: MacAddr,
        src_ip: Ipv4Addr,
        dst_ip: Ipv4Addr,
        src_port: NonZeroU16,
        dst_port: NonZeroU16,
    ) -> Self {
        Self {
            src_mac,
            dst_mac,
            src_ip,
            dst_ip,
            src_port,
            dst_port,
        }
    }

    pub fn src_port(&self) -> u16 {
        self.src_port.get()
    }

    pub fn dst_port(&self) -> u16 {
        self.dst_port.get()
    }
}

/// Header fields of a flow without transport ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AddressFlow {
    src_mac: MacAddr,
    dst_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_ip: Ipv4Addr,
}

impl AddressFlow {
    pub fn new(src_mac: MacAddr, dst_mac: MacAddr, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Self {
        Self {
            src_mac,
            dst_mac,
            src_ip,
            dst_ip,
        }
    }
}

/// Immutable description of one flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FlowDescriptor {
    Icmp(AddressFlow),
    Tcp(TransportFlow),
    Udp(TransportFlow),
    Ospf(AddressFlow),
}

impl FlowDescriptor {
    /// Build a TCP descriptor, rejecting port 0.
    pub fn tcp(
        src_mac: MacAddr,
        dst_mac: MacAddr,
        src_ip: Ipv4Addr,
        dst_ip: Ipv4Addr,
        src_port: u16,
        dst_port: u16,
    ) -> Result<Self> {
        let (src_port, dst_port) = checked_ports(Protocol::Tcp, src_port, dst_port)?;
        Ok(Self::Tcp(TransportFlow::new(
            src_mac, dst_mac, src_ip, dst_ip, src_port, dst_port,
        )))
    }

    /// Build a UDP descriptor, rejecting port 0.
    pub fn udp(
        src_mac: MacAddr,
        dst_mac: MacAddr,
        src_ip: Ipv4Addr,
        dst_ip: Ipv4Addr,
        src_port: u16,
        dst_port: u16,
    ) -> Result<Self> {
        let (src_port, dst_port) = checked_ports(Protocol::Udp, src_port, dst_port)?;
        Ok(Self::Udp(TransportFlow::new(
            src_mac, dst_mac, src_ip, dst_ip, src_port, dst_port,
        )))
    }

    pub fn icmp(src_mac: MacAddr, dst_mac: MacAddr, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Self {
        Self::Icmp(AddressFlow::new(src_mac, dst_mac, src_ip, dst_ip))
    }

    pub fn ospf(src_mac: MacAddr, dst_mac: MacAddr, src_ip: Ipv4Addr, dst_ip: Ipv4Addr) -> Self {
        Self::Ospf(AddressFlow::new(src_mac, dst_mac, src_ip, dst_ip))
    }

    /// OSPF hello from `src_ip`, addressed to the AllSPFRouters group.
    pub fn ospf_hello(src_mac: MacAddr, src_ip: Ipv4Addr) -> Self {
        Self::ospf(
            src_mac,
            MacAddr::ALL_SPF_ROUTERS,
            src_ip,
            Ipv4Addr::new(224, 0, 0, 5),
        )
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            Self::Icmp(_) => Protocol::Icmp,
            Self::Tcp(_) => Protocol::Tcp,
            Self::Udp(_) => Protocol::Udp,
            Self::Ospf(_) => Protocol::Ospf,
        }
    }

    pub fn src_mac(&self) -> MacAddr {
        match self {
            Self::Icmp(f) | Self::Ospf(f) => f.src_mac,
            Self::Tcp(f) | Self::Udp(f) => f.src_mac,
        }
    }

    pub fn dst_mac(&self) -> MacAddr {
        match self {
            Self::Icmp(f) | Self::Ospf(f) => f.dst_mac,
            Self::Tcp(f) | Self::Udp(f) => f.dst_mac,
        }
    }

    pub fn src_ip(&self) -> Ipv4Addr {
        match self {
            Self::Icmp(f) | Self::Ospf(f) => f.src_ip,
            Self::Tcp(f) | Self::Udp(f) => f.src_ip,
        }
    }

    pub fn dst_ip(&self) -> Ipv4Addr {
        match self {
            Self::Icmp(f) | Self::Ospf(f) => f.dst_ip,
            Self::Tcp(f) | Self::Udp(f) => f.dst_ip,
        }
    }

    /// `(source, destination)` ports, present only for TCP and UDP.
    pub fn ports(&self) -> Option<(u16, u16)> {
        match self {
            Self::Tcp(f) | Self::Udp(f) => Some((f.src_port(), f.dst_port())),
            Self::Icmp(_) | Self::Ospf(_) => None,
        }
    }

    /// Flat view of this descriptor.
    pub fn record(&self) -> FlowRecord {
        let ports = self.ports();
        FlowRecord {
            protocol: self.protocol(),
            src_mac: self.src_mac(),
            dst_mac: self.dst_mac(),
            src_ip: self.src_ip(),
            dst_ip: self.dst_ip(),
            src_port: ports.map(|(src, _)| src),
            dst_port: ports.map(|(_, dst)| dst),
        }
    }
}

impl fmt::Display for FlowDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} -> {}", self.protocol(), self.src_mac(), self.dst_mac())?;
        match self.ports() {
            Some((sp, dp)) => write!(f, " {}:{} -> {}:{}", self.src_ip(), sp, self.dst_ip(), dp),
            None => write!(f, " {} -> {}", self.src_ip(), self.dst_ip()),
        }
    }
}

/// Flat, serializable view of a flow with optional ports.
///
/// Converting a record back into a [`FlowDescriptor`] validates that the
/// ports match the protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowRecord {
    pub protocol: Protocol,
    pub src_mac: MacAddr,
    pub dst_mac: MacAddr,
    pub src_ip: Ipv4Addr,
    pub dst_ip: Ipv4Addr,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub src_port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dst_port: Option<u16>,
}

impl TryFrom<FlowRecord> for FlowDescriptor {
    type Error = Error;

    fn try_from(record: FlowRecord) -> Result<Self> {
        let FlowRecord {
            protocol,
            src_mac,
            dst_mac,
            src_ip,
            dst_ip,
            src_port,
            dst_port,
        } = record;

        match protocol {
            Protocol::Tcp | Protocol::Udp => {
                let src_port = src_port.ok_or(DescriptorError::MissingPort {
                    protocol: protocol.name(),
                    field: "source",
                })?;
                let dst_port = dst_port.ok_or(DescriptorError::MissingPort {
                    protocol: protocol.name(),
                    field: "destination",
                })?;
                let (src_port, dst_port) = checked_ports(protocol, src_port, dst_port)?;
                let flow = TransportFlow::new(src_mac, dst_mac, src_ip, dst_ip, src_port, dst_port);
                Ok(if protocol == Protocol::Tcp {
                    Self::Tcp(flow)
                } else {
                    Self::Udp(flow)
                })
            }
            Protocol::Icmp | Protocol::Ospf => {
                if src_port.is_some() {
                    return Err(DescriptorError::UnexpectedPort {
                        protocol: protocol.name(),
                        field: "source",
                    }
                    .into());
                }
                if dst_port.is_some() {
                    return Err(DescriptorError::UnexpectedPort {
                        protocol: protocol.name(),
                        field: "destination",
                    }
                    .into());
                }
                let flow = AddressFlow::new(src_mac, dst_mac, src_ip, dst_ip);
                Ok(if protocol == Protocol::Icmp {
                    Self::Icmp(flow)
                } else {
                    Self::Ospf(flow)
                })
            }
        }
    }
}

fn checked_ports(protocol: Protocol, src: u16, dst: u16) -> Result<(NonZeroU16, NonZeroU16)> {
    let src = NonZeroU16::new(src).ok_or(DescriptorError::ZeroPort {
        protocol: protocol.name(),
        field: "source",
    })?;
    let dst = NonZeroU16::new(dst).ok_or(DescriptorError::ZeroPort {
        protocol: protocol.name(),
        field: "destination",
    })?;
    Ok((src, dst))
}
