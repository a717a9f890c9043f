//! Command frame layout
//!
//! ```text
//! ┌────────┬────────┬──────────────────┬──────────────────┐
//! │ tx hdr │ rx hdr │ tx payload       │ rx payload       │
//! │ 1 byte │ 1 byte │ tx_len bytes     │ rx_len bytes     │
//! └────────┴────────┴──────────────────┴──────────────────┘
//! ```
//!
//! Only the low 6 bits of each header byte carry a length; the upper two
//! bits are flags owned by the emulator and are passed through verbatim.

/// Mask for the 6-bit length fields in the header bytes
pub const LENGTH_MASK: u8 = 0x3F;

/// Size of the two header bytes
pub const HEADER_LEN: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FrameError {
    #[error("Command frame too short: {0} bytes, need at least 2")]
    TooShort(usize),

    #[error("Command frame needs {needed} bytes but buffer holds {capacity}")]
    Overflow { needed: usize, capacity: usize },
}

/// Borrowed view of one emulator command buffer
///
/// Construction checks that header, tx payload and rx payload fit inside
/// the buffer, so the accessors cannot reach past `rx_len`.
#[derive(Debug)]
pub struct CommandFrame<'a> {
    buffer: &'a mut [u8],
    tx_len: usize,
    rx_len: usize,
}

impl<'a> CommandFrame<'a> {
    pub fn parse(buffer: &'a mut [u8]) -> Result<Self, FrameError> {
        if buffer.len() < HEADER_LEN {
            return Err(FrameError::TooShort(buffer.len()));
        }

        let tx_len = usize::from(buffer[0] & LENGTH_MASK);
        let rx_len = usize::from(buffer[1] & LENGTH_MASK);
        let needed = HEADER_LEN + tx_len + rx_len;

        if needed > buffer.len() {
            return Err(FrameError::Overflow {
                needed,
                capacity: buffer.len(),
            });
        }

        Ok(Self {
            buffer,
            tx_len,
            rx_len,
        })
    }

    pub fn tx_len(&self) -> usize {
        self.tx_len
    }

    pub fn rx_len(&self) -> usize {
        self.rx_len
    }

    pub fn tx_payload(&self) -> &[u8] {
        &self.buffer[HEADER_LEN..HEADER_LEN + self.tx_len]
    }

    /// Bytes sent to the adapter: both headers plus the tx payload
    pub fn request(&self) -> &[u8] {
        &self.buffer[..HEADER_LEN + self.tx_len]
    }

    pub fn response(&self) -> &[u8] {
        &self.buffer[self.rx_range()]
    }

    pub fn response_mut(&mut self) -> &mut [u8] {
        let range = self.rx_range();
        &mut self.buffer[range]
    }

    fn rx_range(&self) -> std::ops::Range<usize> {
        let start = HEADER_LEN + self.tx_len;
        start..start + self.rx_len
    }
}
