//! Command-port wire protocol for Ultimate 64 / Ultimate-II+ devices.
//!
//! The device listens on TCP port [`COMMAND_PORT`] and accepts a closed set
//! of binary commands. Each command frame is a little-endian `u16` opcode
//! followed by a length field whose width depends on the opcode family
//! (see [`LengthField`]). Transfer commands are followed directly by the raw
//! file bytes, with no delimiter or checksum.
//!
//! This crate only builds bytes; it performs no I/O.

mod endian;
mod frame;
mod opcode;

pub use endian::{HostOrder, to_wire16, to_wire32};
pub use frame::{
    Action, EncodeError, Frame, MAX_IMAGE_SIZE, MAX_PROGRAM_SIZE, encode,
};
pub use opcode::{LengthField, Opcode};

/// Fixed TCP port of the device command interface.
pub const COMMAND_PORT: u16 = 64;
