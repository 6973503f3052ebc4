//! Sample harvesting from packet captures.
//!
//! Captures carry GSMTAP-encapsulated frames; the GSMTAP header sits at a
//! fixed offset inside each packet's payload and the signalling message
//! follows it. Only frames whose GSMTAP type byte marks signalling payloads
//! are kept, as lowercase hex strings.

use byteorder::ReadBytesExt;
use pcap_parser::pcapng::Block as PcapNgBlock;
use pcap_parser::traits::{PcapNGPacketBlock, PcapReaderIterator};
use pcap_parser::{PcapBlockOwned, PcapError};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

const GSMTAP_HDR_START: usize = 28;
const GSMTAP_HDR_LEN: usize = 16;
const GSMTAP_VERSION: u8 = 2;
const GSMTAP_TYPE_SIGNALLING: u8 = 18;

#[derive(Debug, thiserror::Error)]
pub enum HarvestError {
    #[error("IO: {0}")]
    Io(#[from] std::io::Error),
    #[error("capture read error: {0}")]
    Capture(String),
}

/// Extract the signalling payload from one captured frame, if it carries one.
fn gsmtap_payload(data: &[u8]) -> Option<&[u8]> {
    if data.len() < GSMTAP_HDR_START + GSMTAP_HDR_LEN {
        return None;
    }
    let mut hdr = Cursor::new(&data[GSMTAP_HDR_START..GSMTAP_HDR_START + GSMTAP_HDR_LEN]);
    let version = hdr.read_u8().ok()?;
    let _hdr_words = hdr.read_u8().ok()?;
    let msg_type = hdr.read_u8().ok()?;
    if version != GSMTAP_VERSION || msg_type != GSMTAP_TYPE_SIGNALLING {
        return None;
    }
    Some(&data[GSMTAP_HDR_START + GSMTAP_HDR_LEN..])
}

fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<String>()
}

/// Harvest every signalling payload from one capture file (pcap or pcapng,
/// probed by magic), in capture order.
pub fn harvest_file(path: &Path) -> Result<Vec<String>, HarvestError> {
    let mut probe = [0u8; 4];
    {
        let mut f = File::open(path)?;
        f.read_exact(&mut probe)?;
    }
    let file = File::open(path)?;
    if probe == [0x0a, 0x0d, 0x0d, 0x0a] {
        harvest_pcapng(file)
    } else {
        harvest_legacy_pcap(file)
    }
}

/// Harvest every capture file directly under `dir`, in name order so repeated
/// runs see the same sample sequence.
pub fn harvest_dir(dir: &Path) -> Result<Vec<String>, HarvestError> {
    let mut paths: Vec<_> = std::fs::read_dir(dir)?
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(|entry| entry.path())
        .filter(|p| p.is_file())
        .collect();
    paths.sort();
    let mut out = Vec::new();
    for path in paths {
        out.extend(harvest_file(&path)?);
    }
    Ok(out)
}

fn harvest_legacy_pcap(file: File) -> Result<Vec<String>, HarvestError> {
    let mut reader = pcap_parser::pcap::LegacyPcapReader::new(1 << 20, file)
        .map_err(|e| HarvestError::Capture(format!("{:?}", e)))?;
    let mut out = Vec::new();
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                if let PcapBlockOwned::Legacy(b) = &block {
                    if let Some(payload) = gsmtap_payload(b.data) {
                        out.push(hex_string(payload));
                    }
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| HarvestError::Capture(format!("pcap refill error: {:?}", e)))?;
            }
            Err(e) => return Err(HarvestError::Capture(format!("pcap read error: {:?}", e))),
        }
    }
    Ok(out)
}

fn harvest_pcapng(file: File) -> Result<Vec<String>, HarvestError> {
    let mut reader = pcap_parser::pcapng::PcapNGReader::new(1 << 20, file)
        .map_err(|e| HarvestError::Capture(format!("{:?}", e)))?;
    let mut out = Vec::new();
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                if let PcapBlockOwned::NG(PcapNgBlock::EnhancedPacket(epb)) = &block {
                    if let Some(payload) = gsmtap_payload(epb.packet_data()) {
                        out.push(hex_string(payload));
                    }
                }
                reader.consume(offset);
            }
            Err(PcapError::Eof) => break,
            Err(PcapError::Incomplete(_)) => {
                reader
                    .refill()
                    .map_err(|e| HarvestError::Capture(format!("pcapng refill error: {:?}", e)))?;
            }
            Err(e) => return Err(HarvestError::Capture(format!("pcapng read error: {:?}", e))),
        }
    }
    Ok(out)
}
