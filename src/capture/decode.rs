use pnet::packet::ethernet::{EtherTypes, EthernetPacket};
use pnet::packet::ip::{IpNextHeaderProtocol, IpNextHeaderProtocols};
use pnet::packet::ipv4::Ipv4Packet;
use pnet::packet::ipv6::Ipv6Packet;
use pnet::packet::tcp::TcpPacket;
use pnet::packet::udp::UdpPacket;
use pnet::packet::Packet;
use crate::flow::{Flow, Protocol};

const IPV4_MIN_HEADER: usize = 20;
const IPV6_HEADER: usize = 40;
const IPV6_EXTENSION_MIN: usize = 8;

/// The fields the flow table needs from one captured packet.
#[derive(Debug, Clone, PartialEq)]
pub struct PacketInfo {
    pub flow: Flow,
    /// Original on-the-wire length, not the captured length.
    pub length: u64,
    pub timestamp_us: u64,
}

/// Extract flow fields from an Ethernet frame.
///
/// Returns `None` for anything that is not TCP or UDP over IPv4/IPv6, for
/// IPv4 fragments past the first, IPv6 fragment/AH/ESP headers, and frames
/// too short to hold the headers they claim.
pub fn decode_ethernet(data: &[u8], wire_len: u64, timestamp_us: u64) -> Option<PacketInfo> {
    let ethernet = EthernetPacket::new(data)?;
    let ip_bytes = ethernet.payload();

    let (src_ip, dst_ip, protocol, transport) = match ethernet.get_ethertype() {
        EtherTypes::Ipv4 => {
            let ipv4 = Ipv4Packet::new(ip_bytes)?;
            if ipv4.get_fragment_offset() != 0 {
                return None;
            }
            let header_len = ipv4.get_header_length() as usize * 4;
            if header_len < IPV4_MIN_HEADER || header_len > ip_bytes.len() {
                return None;
            }
            (
                ipv4.get_source().to_string(),
                ipv4.get_destination().to_string(),
                ipv4.get_next_level_protocol(),
                &ip_bytes[header_len..],
            )
        }
        EtherTypes::Ipv6 => {
            let ipv6 = Ipv6Packet::new(ip_bytes)?;
            let (next, transport) =
                skip_ipv6_extensions(ipv6.get_next_header(), &ip_bytes[IPV6_HEADER..])?;
            (
                ipv6.get_source().to_string(),
                ipv6.get_destination().to_string(),
                next,
                transport,
            )
        }
        _ => return None,
    };

    let protocol = transport_protocol(protocol)?;
    let (src_port, dst_port) = transport_ports(protocol, transport)?;

    Some(PacketInfo {
        flow: Flow::new(src_ip, src_port, dst_ip, dst_port, protocol),
        length: wire_len,
        timestamp_us,
    })
}

/// Walk past hop-by-hop, routing and destination options headers.
///
/// Fragment, AH and ESP headers stop the walk; their next header is not a
/// transport protocol, so the packet is skipped.
fn skip_ipv6_extensions(
    mut next: IpNextHeaderProtocol,
    mut rest: &[u8],
) -> Option<(IpNextHeaderProtocol, &[u8])> {
    while matches!(
        next,
        IpNextHeaderProtocols::Hopopt
            | IpNextHeaderProtocols::Ipv6Route
            | IpNextHeaderProtocols::Ipv6Opts
    ) {
        if rest.len() < IPV6_EXTENSION_MIN {
            return None;
        }
        // Length is in 8-octet units, not counting the first 8 octets.
        let header_len = (rest[1] as usize + 1) * 8;
        if header_len > rest.len() {
            return None;
        }
        next = IpNextHeaderProtocol::new(rest[0]);
        rest = &rest[header_len..];
    }
    Some((next, rest))
}

fn transport_protocol(next: IpNextHeaderProtocol) -> Option<Protocol> {
    Protocol::from_number(next.0)
}

fn transport_ports(protocol: Protocol, segment: &[u8]) -> Option<(u16, u16)> {
    match protocol {
        Protocol::Tcp => {
            let tcp = TcpPacket::new(segment)?;
            Some((tcp.get_source(), tcp.get_destination()))
        }
        Protocol::Udp => {
            let udp = UdpPacket::new(segment)?;
            Some((udp.get_source(), udp.get_destination()))
        }
    }
}
