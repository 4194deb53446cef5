use serde::Serialize;
use std::fmt;

/// Transport protocols the detector aggregates. Anything else is dropped
/// before it reaches the flow table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Protocol {
    Tcp,
    Udp,
}

impl Protocol {
    /// IANA protocol number, used as the protocol part of a flow key.
    pub fn number(&self) -> u8 {
        match self {
            Protocol::Tcp => 6,
            Protocol::Udp => 17,
        }
    }

    pub fn from_number(number: u8) -> Option<Self> {
        match number {
            6 => Some(Protocol::Tcp),
            17 => Some(Protocol::Udp),
            _ => None,
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Tcp => write!(f, "TCP"),
            Protocol::Udp => write!(f, "UDP"),
        }
    }
}

/// One direction of a conversation, exactly as the first packet showed it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Flow {
    pub src_ip: String,
    pub src_port: u16,
    pub dst_ip: String,
    pub dst_port: u16,
    pub protocol: Protocol,
}

impl Flow {
    pub fn new(
        src_ip: impl Into<String>,
        src_port: u16,
        dst_ip: impl Into<String>,
        dst_port: u16,
        protocol: Protocol,
    ) -> Self {
        Self {
            src_ip: src_ip.into(),
            src_port,
            dst_ip: dst_ip.into(),
            dst_port,
            protocol,
        }
    }

    /// The same conversation seen from the other side.
    pub fn reversed(&self) -> Self {
        Self {
            src_ip: self.dst_ip.clone(),
            src_port: self.dst_port,
            dst_ip: self.src_ip.clone(),
            dst_port: self.src_port,
            protocol: self.protocol,
        }
    }

    pub fn key(&self) -> FlowKey {
        FlowKey::from_flow(self)
    }
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{} <-> {}:{}",
            self.src_ip, self.src_port, self.dst_ip, self.dst_port
        )
    }
}

/// Direction-independent identity of a conversation.
///
/// Endpoints are stored low-then-high, ordered by address string first and
/// port second, so both directions of a conversation hash to the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FlowKey {
    low_ip: String,
    low_port: u16,
    high_ip: String,
    high_port: u16,
    protocol: Protocol,
}

impl FlowKey {
    pub fn from_flow(flow: &Flow) -> Self {
        let src = (flow.src_ip.as_str(), flow.src_port);
        let dst = (flow.dst_ip.as_str(), flow.dst_port);
        let (low, high) = if src < dst { (src, dst) } else { (dst, src) };

        Self {
            low_ip: low.0.to_string(),
            low_port: low.1,
            high_ip: high.0.to_string(),
            high_port: high.1,
            protocol: flow.protocol,
        }
    }
}

impl fmt::Display for FlowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}->{}:{}:{}",
            self.low_ip,
            self.low_port,
            self.high_ip,
            self.high_port,
            self.protocol.number()
        )
    }
}
