//! Operation requests and payload classification.

use std::path::{Path, PathBuf};

use ulti_proto::Action;

use crate::error::ValidationError;

/// Kind of payload file, decided by its extension alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum FileKind {
    /// A PRG memory image.
    Program,
    /// A D64 disk image.
    Image,
}

/// Classifies a file name by its last three characters.
///
/// `d64` in any case is a disk image; everything else, including names
/// shorter than three characters, is a program. Contents are never read.
pub fn classify(name: impl AsRef<Path>) -> FileKind {
    let bytes = name.as_ref().as_os_str().as_encoded_bytes();
    match bytes.len().checked_sub(3).map(|start| &bytes[start..]) {
        Some(ext) if ext.eq_ignore_ascii_case(b"d64") => FileKind::Image,
        _ => FileKind::Program,
    }
}

/// What the operator asked the device to do.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Operation {
    /// Reset the machine.
    Reset,
    /// Power the machine off.
    PowerOff,
    /// Start audio/video streaming.
    StreamStart,
    /// Stop audio/video streaming.
    StreamStop,
    /// Load a program, or mount a disk image.
    Load(PathBuf),
    /// Load and run a program, or mount and run a disk image.
    Run(PathBuf),
}

impl Operation {
    /// File to transfer, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Self::Load(p) | Self::Run(p) => Some(p),
            Self::Reset | Self::PowerOff | Self::StreamStart | Self::StreamStop => None,
        }
    }

    /// Device action for this operation, classifying any file by name.
    pub fn action(&self) -> Action {
        match self {
            Self::Reset => Action::Reset,
            Self::PowerOff => Action::PowerOff,
            Self::StreamStart => Action::StreamStart,
            Self::StreamStop => Action::StreamStop,
            Self::Load(p) => match classify(p) {
                FileKind::Program => Action::ProgramLoad,
                FileKind::Image => Action::ImageMount,
            },
            Self::Run(p) => match classify(p) {
                FileKind::Program => Action::ProgramRun,
                FileKind::Image => Action::ImageRun,
            },
        }
    }
}

/// Raw action selections as collected from the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionFlags {
    /// Reset requested.
    pub reset: bool,
    /// Power-off requested.
    pub power_off: bool,
    /// Stream start requested.
    pub stream_on: bool,
    /// Stream stop requested.
    pub stream_off: bool,
    /// File to load without running.
    pub load: Option<PathBuf>,
    /// File to load and run.
    pub run: Option<PathBuf>,
}

/// A validated, immutable request for one device operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRequest {
    /// Device host name or address.
    host: String,
    /// Selected operation.
    operation: Operation,
}

impl OperationRequest {
    /// Creates a request for `operation` against `host`.
    pub fn new(host: impl Into<String>, operation: Operation) -> Self {
        Self {
            host: host.into(),
            operation,
        }
    }

    /// Builds a request from raw flags, requiring exactly one action.
    pub fn from_flags(host: impl Into<String>, flags: ActionFlags) -> Result<Self, ValidationError> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(ValidationError::MissingHost);
        }

        let ActionFlags {
            reset,
            power_off,
            stream_on,
            stream_off,
            load,
            run,
        } = flags;

        let mut selected: Vec<(&str, Operation)> = Vec::new();
        if reset {
            selected.push(("reset", Operation::Reset));
        }
        if power_off {
            selected.push(("power off", Operation::PowerOff));
        }
        if stream_on {
            selected.push(("stream on", Operation::StreamStart));
        }
        if stream_off {
            selected.push(("stream off", Operation::StreamStop));
        }
        if let Some(p) = load {
            selected.push(("load", Operation::Load(p)));
        }
        if let Some(p) = run {
            selected.push(("run", Operation::Run(p)));
        }

        match selected.len() {
            0 => Err(ValidationError::NoAction),
            1 => {
                let (_, operation) = selected.remove(0);
                Ok(Self { host, operation })
            }
            _ => {
                let names: Vec<&str> = selected.iter().map(|(name, _)| *name).collect();
                Err(ValidationError::ConflictingActions(names.join(" and ")))
            }
        }
    }

    /// Device host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Selected operation.
    pub const fn operation(&self) -> &Operation {
        &self.operation
    }
}
