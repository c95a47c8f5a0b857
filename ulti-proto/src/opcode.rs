//! Device command table.

/// Encoding of the length field that follows an opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum LengthField {
    /// Two zero bytes; the device ignores the value.
    Zero,
    /// Payload size as a little-endian `u16`.
    Size16,
    /// Payload size as a little-endian `u32`, of which only the low three
    /// bytes are sent. The device reads exactly three bytes here.
    Size24,
}

impl LengthField {
    /// Number of bytes this field occupies on the wire.
    pub const fn width(self) -> usize {
        match self {
            Self::Zero | Self::Size16 => 2,
            Self::Size24 => 3,
        }
    }

    /// Returns `true` if a payload follows a frame with this length field.
    pub const fn carries_payload(self) -> bool {
        !matches!(self, Self::Zero)
    }
}

/// Command opcodes understood by the device command port.
///
/// Values are protocol constants. The stream opcodes are only honoured by
/// the Ultimate 64.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
#[repr(u16)]
pub enum Opcode {
    /// Load a program into memory via DMA.
    Dma = 0xFF01,
    /// Load a program via DMA and run it.
    DmaRun = 0xFF02,
    /// Inject keystrokes.
    Keyboard = 0xFF03,
    /// Reset the machine.
    Reset = 0xFF04,
    /// Wait before the next command.
    Wait = 0xFF05,
    /// Write a block to memory via DMA.
    DmaWrite = 0xFF06,
    /// Write a block to REU memory.
    ReuWrite = 0xFF07,
    /// Replace the KERNAL ROM.
    KernalWrite = 0xFF08,
    /// Load via DMA and jump to an address.
    DmaJump = 0xFF09,
    /// Mount a D64 disk image.
    MountImage = 0xFF0A,
    /// Mount a D64 disk image and run its first program.
    RunImage = 0xFF0B,
    /// Power the machine off.
    PowerOff = 0xFF0C,
    /// Start the VIC video stream.
    VicStreamOn = 0xFF20,
    /// Start the audio stream.
    AudioStreamOn = 0xFF21,
    /// Start the debug bus stream.
    DebugStreamOn = 0xFF22,
    /// Stop the VIC video stream.
    VicStreamOff = 0xFF30,
    /// Stop the audio stream.
    AudioStreamOff = 0xFF31,
    /// Stop the debug bus stream.
    DebugStreamOff = 0xFF32,
}

impl Opcode {
    /// Every known opcode, in numeric order.
    pub const ALL: &'static [Self] = &[
        Self::Dma,
        Self::DmaRun,
        Self::Keyboard,
        Self::Reset,
        Self::Wait,
        Self::DmaWrite,
        Self::ReuWrite,
        Self::KernalWrite,
        Self::DmaJump,
        Self::MountImage,
        Self::RunImage,
        Self::PowerOff,
        Self::VicStreamOn,
        Self::AudioStreamOn,
        Self::DebugStreamOn,
        Self::VicStreamOff,
        Self::AudioStreamOff,
        Self::DebugStreamOff,
    ];

    /// Numeric opcode value in host order.
    pub const fn code(self) -> u16 {
        self as u16
    }

    /// Looks up an opcode by its numeric value.
    pub fn from_code(code: u16) -> Option<Self> {
        Self::ALL.iter().copied().find(|op| op.code() == code)
    }

    /// Length field encoding used by this opcode.
    ///
    /// Only the families this client sends are distinguished; the remaining
    /// opcodes carry their own sub-headers and are not sent as plain frames.
    pub const fn length_field(self) -> LengthField {
        match self {
            Self::Dma | Self::DmaRun => LengthField::Size16,
            Self::MountImage | Self::RunImage => LengthField::Size24,
            _ => LengthField::Zero,
        }
    }
}
