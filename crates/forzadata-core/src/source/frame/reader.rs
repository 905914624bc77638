use super::error::FrameError;
use super::layout;

/// Access to the bytes of one UDP segment (header included).
pub struct UdpSegmentReader<'a> {
    segment: &'a [u8],
}

impl<'a> UdpSegmentReader<'a> {
    pub fn new(segment: &'a [u8]) -> Self {
        Self { segment }
    }

    pub fn payload(&self) -> Result<&'a [u8], FrameError> {
        self.segment
            .get(layout::UDP_HEADER_LEN..)
            .ok_or(FrameError::TooShort {
                needed: layout::UDP_HEADER_LEN,
                actual: self.segment.len(),
            })
    }
}
