//! Remote control client for Ultimate 64 / Ultimate-II+ devices.
//!
//! Sends reset, power-off, stream toggles and program or disk-image
//! transfers to the device command port. Each operation opens one TCP
//! connection, writes its frames and payload, and closes. The device's
//! replies, if any, are not read.
//!
//! # Quick start
//!
//! ```no_run
//! use ulti::{ConnectOptions, Dispatcher, Operation, OperationRequest};
//!
//! let req = OperationRequest::new("192.168.1.64", Operation::Run("demo.prg".into()));
//! let report = Dispatcher::new(ConnectOptions::new()).run(&req)?;
//! println!("sent {} bytes", report.payload_bytes);
//! # Ok::<(), ulti::Error>(())
//! ```

mod conn;
mod dispatch;
mod error;
mod file;
mod request;

pub use conn::{ConnectOptions, Connection, Connector, TcpConnector, Transport};
pub use dispatch::{Dispatcher, Report};
pub use error::{ConnectionError, Error, FileError, Result, ValidationError};
pub use file::{FileResource, FileSource, MappedFiles, Payload};
pub use request::{ActionFlags, FileKind, Operation, OperationRequest, classify};
pub use ulti_proto::{Action, COMMAND_PORT, MAX_IMAGE_SIZE, MAX_PROGRAM_SIZE};
