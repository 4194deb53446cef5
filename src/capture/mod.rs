pub mod decode;
pub mod pcap_engine;

pub use decode::{decode_ethernet, PacketInfo};
pub use pcap_engine::{CaptureError, NetworkStats, PcapEngine};
