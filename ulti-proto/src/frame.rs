//! Command frame encoding.
//!
//! ```text
//! control:  [opcode: u16 LE][0x0000]
//! program:  [opcode: u16 LE][size: u16 LE][payload]
//! image:    [opcode: u16 LE][size: u32 LE, low 3 bytes][payload]
//! ```

use crate::endian::{to_wire16, to_wire32};
use crate::opcode::{LengthField, Opcode};

/// Largest program accepted: the full 64 KiB address space.
pub const MAX_PROGRAM_SIZE: u64 = 65_536;

/// Largest disk image accepted.
pub const MAX_IMAGE_SIZE: u64 = 200_000;

/// Maximum header size: opcode plus the widest length field.
const MAX_HEADER: usize = 5;

/// A single high-level operation understood by the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Action {
    /// Reset the machine.
    Reset,
    /// Power the machine off.
    PowerOff,
    /// Start the video and audio streams.
    StreamStart,
    /// Stop the video and audio streams.
    StreamStop,
    /// DMA-load a program without running it.
    ProgramLoad,
    /// DMA-load a program and run it.
    ProgramRun,
    /// Mount a disk image.
    ImageMount,
    /// Mount a disk image and run it.
    ImageRun,
}

impl Action {
    /// Opcodes sent for this action, in wire order.
    ///
    /// Stream toggles are two independent frames on one connection; the
    /// device has no atomic variant.
    pub const fn opcodes(self) -> &'static [Opcode] {
        match self {
            Self::Reset => &[Opcode::Reset],
            Self::PowerOff => &[Opcode::PowerOff],
            Self::StreamStart => &[Opcode::VicStreamOn, Opcode::AudioStreamOn],
            Self::StreamStop => &[Opcode::VicStreamOff, Opcode::AudioStreamOff],
            Self::ProgramLoad => &[Opcode::Dma],
            Self::ProgramRun => &[Opcode::DmaRun],
            Self::ImageMount => &[Opcode::MountImage],
            Self::ImageRun => &[Opcode::RunImage],
        }
    }

    /// Returns `true` if this action sends a file payload.
    pub const fn is_transfer(self) -> bool {
        self.size_limit().is_some()
    }

    /// Maximum payload size for transfer actions.
    pub const fn size_limit(self) -> Option<u64> {
        match self {
            Self::ProgramLoad | Self::ProgramRun => Some(MAX_PROGRAM_SIZE),
            Self::ImageMount | Self::ImageRun => Some(MAX_IMAGE_SIZE),
            Self::Reset | Self::PowerOff | Self::StreamStart | Self::StreamStop => None,
        }
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Reset => "reset",
            Self::PowerOff => "power off",
            Self::StreamStart => "stream start",
            Self::StreamStop => "stream stop",
            Self::ProgramLoad => "program load",
            Self::ProgramRun => "program run",
            Self::ImageMount => "image mount",
            Self::ImageRun => "image run",
        };
        f.write_str(name)
    }
}

/// Errors produced while encoding an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum EncodeError {
    /// A transfer action was encoded without a payload size.
    #[error("{0} requires a file")]
    MissingSize(Action),
    /// A control action was given a payload size.
    #[error("{0} does not take a file")]
    UnexpectedSize(Action),
    /// The payload is empty.
    #[error("{0}: file is empty")]
    Empty(Action),
    /// The payload exceeds the device limit for this action.
    #[error("{action}: file is {size} bytes, limit is {limit}")]
    TooLarge {
        /// The action being encoded.
        action: Action,
        /// Payload size in bytes.
        size: u64,
        /// Maximum accepted size.
        limit: u64,
    },
}

/// An encoded command header: opcode plus length field.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    /// Command opcode.
    opcode: Opcode,
    /// Encoded bytes; only the first `len` are valid.
    buf: [u8; MAX_HEADER],
    /// Number of valid bytes in `buf`.
    len: usize,
}

impl Frame {
    /// Encodes `opcode` with a length field describing `size` payload bytes.
    ///
    /// `size` is ignored for [`LengthField::Zero`] opcodes and must already
    /// be within the action's limit; [`encode`] checks that.
    #[allow(clippy::cast_possible_truncation)]
    pub(crate) fn new(opcode: Opcode, size: u64) -> Self {
        let mut buf = [0u8; MAX_HEADER];
        buf[..2].copy_from_slice(&to_wire16(opcode.code()).to_ne_bytes());

        let field = opcode.length_field();
        match field {
            LengthField::Zero => {}
            // A full 64 KiB program wraps to 0x0000; the device treats it
            // the same way.
            LengthField::Size16 => {
                buf[2..4].copy_from_slice(&to_wire16(size as u16).to_ne_bytes());
            }
            LengthField::Size24 => {
                let wide = to_wire32(size as u32).to_ne_bytes();
                buf[2..5].copy_from_slice(&wide[..3]);
            }
        }

        Self {
            opcode,
            buf,
            len: 2 + field.width(),
        }
    }

    /// The opcode this frame carries.
    pub const fn opcode(&self) -> Opcode {
        self.opcode
    }

    /// Header bytes exactly as sent on the wire.
    pub fn header(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Returns `true` if the file payload follows this frame.
    pub const fn carries_payload(&self) -> bool {
        self.opcode.length_field().carries_payload()
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("opcode", &self.opcode)
            .field("header", &self.header())
            .finish()
    }
}

/// Encodes `action` into its frame sequence.
///
/// `file_size` must be `Some` for transfer actions and `None` otherwise.
/// Size limits are enforced here so an oversized file is rejected before
/// anything is sent.
pub fn encode(action: Action, file_size: Option<u64>) -> Result<Vec<Frame>, EncodeError> {
    let size = match (action.size_limit(), file_size) {
        (None, None) => 0,
        (None, Some(_)) => return Err(EncodeError::UnexpectedSize(action)),
        (Some(_), None) => return Err(EncodeError::MissingSize(action)),
        (Some(_), Some(0)) => return Err(EncodeError::Empty(action)),
        (Some(limit), Some(size)) if size > limit => {
            return Err(EncodeError::TooLarge {
                action,
                size,
                limit,
            });
        }
        (Some(_), Some(size)) => size,
    };

    Ok(action
        .opcodes()
        .iter()
        .map(|&op| Frame::new(op, size))
        .collect())
}
