use log::{debug, info, warn};
use pcap::{Active, Capture, Device, Linktype};
use std::sync::Arc;
use thiserror::Error;
use crate::capture::decode::decode_ethernet;
use crate::config::CaptureConfig;
use crate::flow::FlowTable;
use crate::utils::formatting::format_bytes;

#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Could not open device '{device}': {source}. Try running with sudo or: sudo setcap cap_net_raw,cap_net_admin=eip ./pivot-detector")]
    DeviceOpen {
        device: String,
        #[source]
        source: pcap::Error,
    },

    #[error("Failed to set capture filter '{filter}': {source}")]
    FilterSet {
        filter: String,
        #[source]
        source: pcap::Error,
    },

    #[error("Packet capture failed: {0}")]
    PacketRead(#[from] pcap::Error),

    #[error("Device error: {0}")]
    DeviceError(String),
}

#[derive(Debug, Clone, Default)]
pub struct NetworkStats {
    pub packets_captured: u64,
    pub bytes_captured: u64,
    pub packets_skipped: u64,
    pub interface: String,
}

impl NetworkStats {
    /// One-line account of what the capture loop has seen so far.
    pub fn summary(&self) -> String {
        format!(
            "{} packets ({}) seen on {}, {} skipped",
            self.packets_captured,
            format_bytes(self.bytes_captured),
            self.interface,
            self.packets_skipped
        )
    }
}

pub struct PcapEngine {
    capture: Capture<Active>,
    interface: String,
    stats: NetworkStats,
}

impl PcapEngine {
    /// Open `interface` for live capture. Failure here is fatal to the
    /// caller: there is nothing to analyze without a capture handle.
    pub fn open(interface: &str, config: &CaptureConfig) -> Result<Self, CaptureError> {
        info!("Opening capture on interface: {}", interface);

        let device_open = |source| CaptureError::DeviceOpen {
            device: interface.to_string(),
            source,
        };

        let mut capture = Capture::from_device(interface)
            .map_err(device_open)?
            .promisc(config.promiscuous)
            .snaplen(config.snaplen)
            .timeout(config.timeout_ms)
            .open()
            .map_err(device_open)?;

        if let Some(filter) = &config.filter {
            capture.filter(filter, true).map_err(|source| CaptureError::FilterSet {
                filter: filter.clone(),
                source,
            })?;
            info!("Applied capture filter: {}", filter);
        }

        let linktype = capture.get_datalink();
        if linktype != Linktype::ETHERNET {
            warn!(
                "Interface {} uses link type {:?}; only Ethernet frames are decoded",
                interface, linktype
            );
        }

        Ok(Self {
            capture,
            interface: interface.to_string(),
            stats: NetworkStats {
                interface: interface.to_string(),
                ..NetworkStats::default()
            },
        })
    }

    pub fn list_devices() -> Result<Vec<String>, CaptureError> {
        Device::list()
            .map(|devices| devices.into_iter().map(|d| d.name).collect())
            .map_err(|e| CaptureError::DeviceError(format!("Failed to list devices: {}", e)))
    }

    /// Feed every captured packet into `table` until capture fails.
    ///
    /// Read timeouts are not failures; the loop keeps waiting for traffic.
    pub fn run(&mut self, table: Arc<FlowTable>) -> Result<(), CaptureError> {
        info!("Starting packet capture on interface: {}", self.interface);

        loop {
            let packet = match self.capture.next_packet() {
                Ok(packet) => packet,
                Err(pcap::Error::TimeoutExpired) => continue,
                Err(e) => {
                    self.log_statistics();
                    return Err(CaptureError::PacketRead(e));
                }
            };

            let wire_len = packet.header.len as u64;
            let ts = packet.header.ts;
            let timestamp_us = (ts.tv_sec as u64) * 1_000_000 + ts.tv_usec as u64;

            self.stats.packets_captured += 1;
            self.stats.bytes_captured += wire_len;

            match decode_ethernet(packet.data, wire_len, timestamp_us) {
                Some(info) => table.observe(&info),
                None => {
                    self.stats.packets_skipped += 1;
                    debug!("Skipped undecodable or non-TCP/UDP packet ({} bytes)", wire_len);
                }
            }
        }
    }

    pub fn get_statistics(&self) -> &NetworkStats {
        &self.stats
    }

    fn log_statistics(&mut self) {
        match self.capture.stats() {
            Ok(stat) => info!(
                "Capture: {}, {} received by filter, {} dropped",
                self.stats.summary(),
                stat.received,
                stat.dropped
            ),
            Err(e) => warn!("Could not read capture statistics: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stats_summary_includes_bytes() {
        let stats = NetworkStats {
            packets_captured: 3,
            bytes_captured: 2048,
            packets_skipped: 1,
            interface: "eth0".to_string(),
        };
        assert_eq!(stats.summary(), "3 packets (2.00 KiB) seen on eth0, 1 skipped");
    }

    #[test]
    fn test_empty_stats_summary() {
        let stats = NetworkStats::default();
        assert_eq!(stats.summary(), "0 packets (0 B) seen on , 0 skipped");
    }
}
