//! End-to-end tests against a simulated device and instrumented doubles.

use std::cell::{Cell, RefCell};
use std::io::{self, Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::rc::Rc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use ulti::{
    Action, ActionFlags, ConnectOptions, ConnectionError, Connector, Dispatcher, Error, FileError,
    FileSource, MAX_IMAGE_SIZE, MAX_PROGRAM_SIZE, Operation, OperationRequest, Payload, Transport,
    ValidationError,
};

/// Accepts one connection on an ephemeral port and returns everything sent.
fn device() -> (u16, JoinHandle<Vec<u8>>) {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        let mut buf = Vec::new();
        stream.read_to_end(&mut buf).unwrap();
        buf
    });
    (port, handle)
}

fn dispatcher(port: u16) -> Dispatcher {
    Dispatcher::new(
        ConnectOptions::new()
            .port(port)
            .timeout(Some(Duration::from_secs(5))),
    )
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> std::path::PathBuf {
    let path = dir.join(name);
    let mut f = std::fs::File::create(&path).unwrap();
    f.write_all(contents).unwrap();
    path
}

#[test]
fn program_run_wire_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let body: Vec<u8> = (1..=10).collect();
    let path = write_file(dir.path(), "demo.prg", &body);

    let (port, dev) = device();
    let req = OperationRequest::new("127.0.0.1", Operation::Run(path));
    let report = dispatcher(port).run(&req).unwrap();

    let mut expected = vec![0x02, 0xFF, 0x0A, 0x00];
    expected.extend_from_slice(&body);
    assert_eq!(dev.join().unwrap(), expected);
    assert_eq!(report.action, Action::ProgramRun);
    assert_eq!(report.frames, 1);
    assert_eq!(report.payload_bytes, 10);
}

#[test]
fn image_mount_sends_three_length_bytes() {
    let dir = tempfile::tempdir().unwrap();
    let body = vec![0xAA; 0x01_0203];
    let path = write_file(dir.path(), "DISK.D64", &body);

    let (port, dev) = device();
    let req = OperationRequest::new("127.0.0.1", Operation::Load(path));
    let report = dispatcher(port).run(&req).unwrap();

    let wire = dev.join().unwrap();
    assert_eq!(&wire[..5], &[0x0A, 0xFF, 0x03, 0x02, 0x01]);
    assert_eq!(&wire[5..], &body[..]);
    assert_eq!(report.action, Action::ImageMount);
}

#[test]
fn stream_start_sends_both_frames() {
    let (port, dev) = device();
    let req = OperationRequest::new("127.0.0.1", Operation::StreamStart);
    let report = dispatcher(port).run(&req).unwrap();

    assert_eq!(
        dev.join().unwrap(),
        vec![0x20, 0xFF, 0x00, 0x00, 0x21, 0xFF, 0x00, 0x00]
    );
    assert_eq!(report.frames, 2);
    assert_eq!(report.payload_bytes, 0);
}

#[test]
fn reset_and_power_off() {
    for (op, opcode) in [(Operation::Reset, 0x04), (Operation::PowerOff, 0x0C)] {
        let (port, dev) = device();
        dispatcher(port)
            .run(&OperationRequest::new("127.0.0.1", op))
            .unwrap();
        assert_eq!(dev.join().unwrap(), vec![opcode, 0xFF, 0x00, 0x00]);
    }
}

#[test]
fn oversized_program_rejected_before_connecting() {
    let dir = tempfile::tempdir().unwrap();
    let size = usize::try_from(MAX_PROGRAM_SIZE).unwrap() + 1;
    let path = write_file(dir.path(), "big.prg", &vec![0; size]);

    // Nothing listens here; reaching the network would be a connect error.
    let req = OperationRequest::new("127.0.0.1", Operation::Run(path));
    let err = dispatcher(1).run(&req).unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::Encode(_))), "{err}");
}

#[test]
fn missing_file_is_file_error() {
    let dir = tempfile::tempdir().unwrap();
    let req = OperationRequest::new("127.0.0.1", Operation::Load(dir.path().join("gone.d64")));
    let err = dispatcher(1).run(&req).unwrap_err();
    assert!(matches!(err, Error::File(FileError::NotFound { .. })));
}

#[test]
fn refused_connection_is_connect_error() {
    let port = {
        let l = TcpListener::bind("127.0.0.1:0").unwrap();
        l.local_addr().unwrap().port()
    };
    let req = OperationRequest::new("127.0.0.1", Operation::Reset);
    let err = dispatcher(port).run(&req).unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::ConnectFailed { .. })
    ));
}

// ---------------------------------------------------------------------------
// Instrumented doubles
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
struct Counters {
    files_opened: Cell<usize>,
    files_closed: Cell<usize>,
    conns_opened: Cell<usize>,
    conns_closed: Cell<usize>,
    sent: RefCell<Vec<u8>>,
}

#[derive(Debug, Clone, Copy)]
enum Fault {
    None,
    Resolve,
    Connect,
    /// Fail the n-th send call (0-based).
    Send(usize),
}

struct FakeFile {
    data: Vec<u8>,
    counters: Rc<Counters>,
}

impl Payload for FakeFile {
    fn bytes(&self) -> &[u8] {
        &self.data
    }
}

impl Drop for FakeFile {
    fn drop(&mut self) {
        self.counters.files_closed.set(self.counters.files_closed.get() + 1);
    }
}

struct FakeFiles {
    size: usize,
    counters: Rc<Counters>,
}

impl FileSource for FakeFiles {
    type File = FakeFile;

    fn open(&self, _path: &Path) -> Result<FakeFile, FileError> {
        self.counters.files_opened.set(self.counters.files_opened.get() + 1);
        Ok(FakeFile {
            data: vec![0x5A; self.size],
            counters: Rc::clone(&self.counters),
        })
    }
}

struct FakeConn {
    sends: usize,
    fault: Fault,
    counters: Rc<Counters>,
}

impl Transport for FakeConn {
    fn send(&mut self, bytes: &[u8]) -> Result<(), ConnectionError> {
        let n = self.sends;
        self.sends += 1;
        if matches!(self.fault, Fault::Send(at) if at == n) {
            return Err(ConnectionError::SendFailed(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "pipe closed",
            )));
        }
        self.counters.sent.borrow_mut().extend_from_slice(bytes);
        Ok(())
    }
}

impl Drop for FakeConn {
    fn drop(&mut self) {
        self.counters.conns_closed.set(self.counters.conns_closed.get() + 1);
    }
}

struct FakeConnector {
    fault: Fault,
    counters: Rc<Counters>,
}

impl Connector for FakeConnector {
    type Conn = FakeConn;

    fn connect(&self, host: &str) -> Result<FakeConn, ConnectionError> {
        match self.fault {
            Fault::Resolve => Err(ConnectionError::ResolutionFailed {
                host: host.to_owned(),
                source: io::Error::new(io::ErrorKind::NotFound, "no addresses found"),
            }),
            Fault::Connect => Err(ConnectionError::ConnectFailed {
                host: host.to_owned(),
                source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
            }),
            Fault::None | Fault::Send(_) => {
                self.counters.conns_opened.set(self.counters.conns_opened.get() + 1);
                Ok(FakeConn {
                    sends: 0,
                    fault: self.fault,
                    counters: Rc::clone(&self.counters),
                })
            }
        }
    }
}

fn fake(fault: Fault, size: usize) -> (Dispatcher<FakeConnector, FakeFiles>, Rc<Counters>) {
    let counters = Rc::new(Counters::default());
    let d = Dispatcher::with(
        FakeConnector {
            fault,
            counters: Rc::clone(&counters),
        },
        FakeFiles {
            size,
            counters: Rc::clone(&counters),
        },
    );
    (d, counters)
}

fn assert_balanced(c: &Counters, files: usize, conns: usize) {
    assert_eq!(c.files_opened.get(), files, "files opened");
    assert_eq!(c.files_closed.get(), files, "files closed");
    assert_eq!(c.conns_opened.get(), conns, "connections opened");
    assert_eq!(c.conns_closed.get(), conns, "connections closed");
}

#[test]
fn releases_on_success() {
    let (d, c) = fake(Fault::None, 10);
    d.run(&OperationRequest::new("dev", Operation::Run("a.prg".into())))
        .unwrap();
    assert_balanced(&c, 1, 1);
    assert_eq!(c.sent.borrow().len(), 4 + 10);
}

#[test]
fn releases_on_resolution_failure() {
    let (d, c) = fake(Fault::Resolve, 10);
    let err = d
        .run(&OperationRequest::new("dev", Operation::Run("a.prg".into())))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::ResolutionFailed { .. })
    ));
    assert_balanced(&c, 1, 0);
}

#[test]
fn releases_on_connect_failure() {
    let (d, c) = fake(Fault::Connect, 10);
    let err = d
        .run(&OperationRequest::new("dev", Operation::Load("a.d64".into())))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::ConnectFailed { .. })
    ));
    assert_balanced(&c, 1, 0);
}

#[test]
fn releases_on_payload_send_failure() {
    // Send 0 is the header, send 1 the payload.
    let (d, c) = fake(Fault::Send(1), 10);
    let err = d
        .run(&OperationRequest::new("dev", Operation::Run("a.d64".into())))
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Connection(ConnectionError::SendFailed(_))
    ));
    assert_balanced(&c, 1, 1);
    assert_eq!(c.sent.borrow().as_slice(), &[0x0B, 0xFF, 0x0A, 0x00, 0x00]);
}

#[test]
fn releases_on_oversized_file() {
    let size = usize::try_from(MAX_IMAGE_SIZE).unwrap() + 1;
    let (d, c) = fake(Fault::None, size);
    let err = d
        .run(&OperationRequest::new("dev", Operation::Run("a.d64".into())))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert_balanced(&c, 1, 0);
}

#[test]
fn second_stream_frame_failure_aborts() {
    let (d, c) = fake(Fault::Send(1), 0);
    let err = d
        .run(&OperationRequest::new("dev", Operation::StreamStop))
        .unwrap_err();
    assert!(matches!(err, Error::Connection(_)));
    assert_balanced(&c, 0, 1);
    assert_eq!(c.sent.borrow().as_slice(), &[0x30, 0xFF, 0x00, 0x00]);
}

#[test]
fn conflicting_flags_never_reach_the_network() {
    let (_, c) = fake(Fault::None, 10);
    let flags = ActionFlags {
        reset: true,
        stream_on: true,
        ..ActionFlags::default()
    };
    assert!(OperationRequest::from_flags("dev", flags).is_err());
    assert_balanced(&c, 0, 0);
}

#[test]
fn empty_program_is_rejected() {
    let (d, c) = fake(Fault::None, 0);
    let err = d
        .run(&OperationRequest::new("dev", Operation::Load("a.prg".into())))
        .unwrap_err();
    assert!(matches!(err, Error::Validation(ValidationError::Encode(_))));
    assert_balanced(&c, 1, 0);
}
