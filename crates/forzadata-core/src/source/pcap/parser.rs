use std::fs::File;
use std::path::Path;

use pcap_parser::{
    Block, LegacyPcapReader, Linktype, PcapBlockOwned, PcapError, PcapNGReader,
    traits::PcapReaderIterator,
};
use tracing::debug;

use crate::source::{PacketEvent, PacketSource, SourceError};

use super::error::PcapSourceError;
use super::layout;
use super::reader::{
    is_pcapng_magic, legacy_ts_to_seconds, linktype_for_interface, pcapng_ts_to_seconds,
    read_magic_and_rewind,
};

/// Link-layer frames read from a `.pcap` or `.pcapng` file.
pub struct PcapFileSource {
    inner: PcapReader,
}

enum PcapReader {
    Legacy {
        reader: LegacyPcapReader<File>,
        linktype: Option<Linktype>,
    },
    Ng {
        reader: PcapNGReader<File>,
        linktypes: Vec<Linktype>,
    },
}

impl PcapFileSource {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        let file = File::open(path)?;
        let inner = create_reader(file)?;
        debug!(path = %path.display(), "opened capture file");
        Ok(Self { inner })
    }
}

impl PacketSource for PcapFileSource {
    fn next_packet(&mut self) -> Result<Option<PacketEvent>, SourceError> {
        next_packet(&mut self.inner).map_err(SourceError::from)
    }
}

fn create_reader(mut file: File) -> Result<PcapReader, PcapSourceError> {
    let magic = read_magic_and_rewind(&mut file)?;

    if is_pcapng_magic(&magic) {
        let reader = PcapNGReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| pcap_error("pcapng reader init", e))?;
        Ok(PcapReader::Ng {
            reader,
            linktypes: Vec::new(),
        })
    } else {
        let reader = LegacyPcapReader::new(layout::PCAP_READER_BUFFER_SIZE, file)
            .map_err(|e| pcap_error("pcap reader init", e))?;
        Ok(PcapReader::Legacy {
            reader,
            linktype: None,
        })
    }
}

fn next_packet(reader: &mut PcapReader) -> Result<Option<PacketEvent>, PcapSourceError> {
    match reader {
        PcapReader::Legacy { reader, linktype } => drain(reader, LEGACY_CONTEXTS, |block| match block {
            PcapBlockOwned::LegacyHeader(header) => {
                *linktype = Some(header.network);
                None
            }
            PcapBlockOwned::Legacy(packet) => Some(PacketEvent {
                ts: Some(legacy_ts_to_seconds(packet.ts_sec, packet.ts_usec)),
                linktype: linktype.unwrap_or(Linktype::ETHERNET),
                data: packet.data.to_vec(),
            }),
            _ => None,
        }),
        PcapReader::Ng { reader, linktypes } => drain(reader, NG_CONTEXTS, |block| match block {
            PcapBlockOwned::NG(Block::InterfaceDescription(intf)) => {
                linktypes.push(intf.linktype);
                None
            }
            PcapBlockOwned::NG(Block::EnhancedPacket(packet)) => Some(PacketEvent {
                ts: Some(pcapng_ts_to_seconds(packet.ts_high, packet.ts_low)),
                linktype: linktype_for_interface(linktypes, packet.if_id),
                data: captured_bytes(packet.data, packet.caplen).to_vec(),
            }),
            _ => None,
        }),
    }
}

struct ReaderContexts {
    refill: &'static str,
    next: &'static str,
}

const LEGACY_CONTEXTS: ReaderContexts = ReaderContexts {
    refill: "pcap reader refill",
    next: "pcap reader next",
};

const NG_CONTEXTS: ReaderContexts = ReaderContexts {
    refill: "pcapng reader refill",
    next: "pcapng reader next",
};

/// Pull blocks until one maps to a packet event or the file ends.
fn drain<R, F>(
    reader: &mut R,
    contexts: ReaderContexts,
    mut on_block: F,
) -> Result<Option<PacketEvent>, PcapSourceError>
where
    R: PcapReaderIterator,
    F: FnMut(PcapBlockOwned<'_>) -> Option<PacketEvent>,
{
    loop {
        match reader.next() {
            Ok((offset, block)) => {
                let event = on_block(block);
                reader.consume(offset);
                if event.is_some() {
                    return Ok(event);
                }
            }
            Err(PcapError::Eof) => return Ok(None),
            Err(PcapError::Incomplete(_)) => {
                reader.refill().map_err(|e| pcap_error(contexts.refill, e))?;
            }
            Err(e) => return Err(pcap_error(contexts.next, e)),
        }
    }
}

/// Enhanced packet blocks carry 32-bit padding after the captured bytes.
fn captured_bytes(data: &[u8], caplen: u32) -> &[u8] {
    let len = (caplen as usize).min(data.len());
    &data[..len]
}

fn pcap_error<E: std::fmt::Display>(context: &'static str, err: E) -> PcapSourceError {
    PcapSourceError::Pcap {
        context,
        message: err.to_string(),
    }
}
