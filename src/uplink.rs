//! Fixed-width ASCII uplink messages.
//!
//! The radio/serial link carries short positional strings: a four or
//! seven letter tag, then zero-padded decimal fields.
//!
//! | Message      | Encoding      |
//! |--------------|---------------|
//! | Flush        | `FLSHddddd`   |
//! | Pit full     | `PITFULL`     |

use core::fmt::Write;

use heapless::String;

/// Bytes in the transmit buffer.
pub const MESSAGE_CAP: usize = 12;

/// Largest duration the five-digit field can carry.
pub const MAX_FLUSH_MS: u32 = 99_999;

pub type Encoded = String<MESSAGE_CAP>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UplinkMessage {
    /// A flush was detected; outflow sensed for `duration_ms`.
    Flush { duration_ms: u32 },
    /// The level test found the pit full.
    PitFull,
}

impl UplinkMessage {
    pub fn encode(&self) -> Encoded {
        let mut out = Encoded::new();
        let written = match self {
            Self::Flush { duration_ms } => write!(out, "FLSH{:05}", (*duration_ms).min(MAX_FLUSH_MS)),
            Self::PitFull => out.write_str("PITFULL"),
        };
        debug_assert!(written.is_ok(), "every variant fits MESSAGE_CAP");
        out
    }
}
