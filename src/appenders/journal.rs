//! systemd journal sink using the native journal protocol
//!
//! Each record becomes one entry of `KEY=VALUE\n` fields. Values containing a
//! newline use the binary-safe form: the key, a newline, the value length as
//! a little-endian `u64`, the raw value and a trailing newline.

use crate::core::{ForwarderError, HostLogSink, JournalPriority, LogRecord, Result};
use parking_lot::Mutex;
use std::io::Write;
#[cfg(unix)]
use std::os::unix::net::UnixDatagram;
use std::path::Path;

/// Default journald native socket
pub const JOURNAL_SOCKET: &str = "/run/systemd/journal/socket";

enum Target {
    #[cfg(unix)]
    Socket(UnixDatagram),
    Writer(Mutex<Box<dyn Write + Send>>),
}

/// Host sink speaking the journal's native protocol
///
/// # Example
///
/// ```
/// use log_forwarder::appenders::JournalSink;
/// use log_forwarder::core::{JournalPriority, LogLevel, LogRecord};
///
/// let record = LogRecord::new(LogLevel::Error, "disk full")
///     .with_location("x.cc", "write", 42)
///     .with_name("/writer");
/// let entry = JournalSink::encode(&record, JournalPriority::Err);
///
/// let text = String::from_utf8(entry).unwrap();
/// assert!(text.contains("MESSAGE=disk full\n"));
/// assert!(text.contains("PRIORITY=3\n"));
/// assert!(text.contains("CODE_LINE=42\n"));
/// ```
pub struct JournalSink {
    target: Target,
}

impl JournalSink {
    /// Connect to the local journald socket
    #[cfg(unix)]
    pub fn connect() -> Result<Self> {
        Self::connect_to(JOURNAL_SOCKET)
    }

    /// Connect to a journal-compatible datagram socket at `path`
    #[cfg(unix)]
    pub fn connect_to<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let socket = UnixDatagram::unbound()?;
        socket.connect(path).map_err(|e| {
            ForwarderError::io_operation(
                "connecting to journal",
                format!("cannot reach '{}'", path.display()),
                e,
            )
        })?;
        Ok(Self {
            target: Target::Socket(socket),
        })
    }

    /// Write entries to an arbitrary stream, one blank line between entries
    pub fn to_writer<W: Write + Send + 'static>(writer: W) -> Self {
        Self {
            target: Target::Writer(Mutex::new(Box::new(writer))),
        }
    }

    /// Append entries to a file, creating it if needed
    pub fn to_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?;
        Ok(Self::to_writer(std::io::BufWriter::new(file)))
    }

    /// Serialize one record as a native-protocol entry
    pub fn encode(record: &LogRecord, priority: JournalPriority) -> Vec<u8> {
        let mut entry = Vec::with_capacity(128 + record.message.len());
        append_field(&mut entry, "MESSAGE", &record.message);
        append_field(&mut entry, "PRIORITY", &priority.value().to_string());
        append_field(&mut entry, "CODE_FILE", &record.file);
        append_field(&mut entry, "CODE_LINE", &record.line.to_string());
        append_field(&mut entry, "CODE_FUNC", &record.function);
        append_field(&mut entry, "SYSLOG_IDENTIFIER", &record.name);
        entry
    }
}

fn append_field(entry: &mut Vec<u8>, key: &str, value: &str) {
    entry.extend_from_slice(key.as_bytes());
    if value.contains('\n') {
        entry.push(b'\n');
        entry.extend_from_slice(&(value.len() as u64).to_le_bytes());
        entry.extend_from_slice(value.as_bytes());
    } else {
        entry.push(b'=');
        entry.extend_from_slice(value.as_bytes());
    }
    entry.push(b'\n');
}

/// Hand an oversized entry to journald as a sealed memfd
///
/// journald reads the whole entry from a descriptor passed with an empty
/// datagram when the payload exceeds the socket's datagram limit.
#[cfg(target_os = "linux")]
fn send_via_memfd(socket: &UnixDatagram, entry: &[u8]) -> Result<()> {
    use nix::fcntl::{fcntl, FcntlArg, SealFlag};
    use nix::sys::memfd::{memfd_create, MemFdCreateFlag};
    use nix::sys::socket::{sendmsg, ControlMessage, MsgFlags};
    use std::ffi::CStr;
    use std::io::IoSlice;
    use std::os::unix::io::AsRawFd;

    let name = CStr::from_bytes_with_nul(b"journal-entry\0")
        .map_err(|e| ForwarderError::sink("journal", e.to_string()))?;
    let fd = memfd_create(
        name,
        MemFdCreateFlag::MFD_CLOEXEC | MemFdCreateFlag::MFD_ALLOW_SEALING,
    )
    .map_err(|e| ForwarderError::sink("journal", format!("memfd_create: {}", e)))?;

    let mut file = std::fs::File::from(fd);
    file.write_all(entry)?;

    // journald refuses descriptors it could see change underneath it
    fcntl(
        file.as_raw_fd(),
        FcntlArg::F_ADD_SEALS(
            SealFlag::F_SEAL_SHRINK
                | SealFlag::F_SEAL_GROW
                | SealFlag::F_SEAL_WRITE
                | SealFlag::F_SEAL_SEAL,
        ),
    )
    .map_err(|e| ForwarderError::sink("journal", format!("sealing memfd: {}", e)))?;

    let fds = [file.as_raw_fd()];
    let cmsg = [ControlMessage::ScmRights(&fds)];
    let iov: [IoSlice; 0] = [];
    sendmsg::<()>(socket.as_raw_fd(), &iov, &cmsg, MsgFlags::empty(), None)
        .map_err(|e| ForwarderError::sink("journal", format!("passing memfd: {}", e)))?;
    Ok(())
}

impl HostLogSink for JournalSink {
    fn emit(&self, record: &LogRecord, priority: JournalPriority) -> Result<()> {
        let entry = Self::encode(record, priority);
        match &self.target {
            #[cfg(unix)]
            Target::Socket(socket) => match socket.send(&entry) {
                Ok(_) => {}
                #[cfg(target_os = "linux")]
                Err(e) if e.raw_os_error() == Some(nix::errno::Errno::EMSGSIZE as i32) => {
                    send_via_memfd(socket, &entry)?;
                }
                Err(e) => return Err(ForwarderError::sink("journal", e.to_string())),
            },
            Target::Writer(writer) => {
                let mut writer = writer.lock();
                writer.write_all(&entry)?;
                writer.write_all(b"\n")?;
                writer.flush()?;
            }
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "journal"
    }
}
