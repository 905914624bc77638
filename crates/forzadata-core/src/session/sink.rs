use std::io::Write;

use thiserror::Error;

use crate::packet::Packet;

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("failed to write record: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to serialize record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Consumer of decoded packets.
pub trait RecordSink {
    fn write_packet(&mut self, packet: &Packet) -> Result<(), SinkError>;

    fn flush(&mut self) -> Result<(), SinkError> {
        Ok(())
    }
}

/// Writes one JSON object per packet, newline separated.
pub struct JsonLinesSink<W: Write> {
    writer: W,
    pretty: bool,
}

impl<W: Write> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            pretty: false,
        }
    }

    pub fn pretty(writer: W) -> Self {
        Self {
            writer,
            pretty: true,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RecordSink for JsonLinesSink<W> {
    fn write_packet(&mut self, packet: &Packet) -> Result<(), SinkError> {
        if self.pretty {
            serde_json::to_writer_pretty(&mut self.writer, packet)?;
        } else {
            serde_json::to_writer(&mut self.writer, packet)?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        self.writer.flush()?;
        Ok(())
    }
}

impl<T: RecordSink + ?Sized> RecordSink for &mut T {
    fn write_packet(&mut self, packet: &Packet) -> Result<(), SinkError> {
        (**self).write_packet(packet)
    }

    fn flush(&mut self) -> Result<(), SinkError> {
        (**self).flush()
    }
}

impl RecordSink for Vec<Packet> {
    fn write_packet(&mut self, packet: &Packet) -> Result<(), SinkError> {
        self.push(packet.clone());
        Ok(())
    }
}
