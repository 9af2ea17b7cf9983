//! Per-connection client state.
//!
//! A [`Client`] owns its socket and the two byte accumulators: unframed
//! input and unsent output. All socket I/O is non-blocking; the event loop
//! drives both directions off readiness events.

use std::io::{self, Read, Write};
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

use bytes::{Buf, BytesMut};
use mio::net::TcpStream;
use pirc_proto::LineBuffer;

/// Result of draining the socket into the input buffer.
#[derive(Debug)]
pub enum ReadOutcome {
    /// Drained until the socket would block; the connection stays open.
    Open,
    /// The peer closed the connection (`read` returned 0).
    Closed,
    /// A non-transient read error.
    Error(io::Error),
}

/// One accepted connection and everything the server knows about it.
#[derive(Debug)]
pub struct Client {
    stream: TcpStream,
    addr: SocketAddr,
    fd: RawFd,

    /// Nickname, once a NICK has been accepted.
    pub nick: Option<String>,
    /// Username from USER.
    pub user: Option<String>,
    /// Realname from USER.
    pub realname: Option<String>,

    /// The shared server password was supplied correctly.
    pub pass_ok: bool,
    /// A nickname has been accepted.
    pub nick_ok: bool,
    /// USER details have been accepted.
    pub user_ok: bool,
    /// Registration is complete. Monotonic: never reset.
    pub registered: bool,

    /// Bytes received but not yet framed into lines.
    pub recv_buf: LineBuffer,
    /// Bytes queued for sending but not yet written.
    pub send_buf: BytesMut,
    /// Whether the poll registration currently includes write interest.
    pub write_interest: bool,
}

impl Client {
    pub fn new(stream: TcpStream, addr: SocketAddr) -> Self {
        let fd = stream.as_raw_fd();
        Self {
            stream,
            addr,
            fd,
            nick: None,
            user: None,
            realname: None,
            pass_ok: false,
            nick_ok: false,
            user_ok: false,
            registered: false,
            recv_buf: LineBuffer::new(),
            send_buf: BytesMut::new(),
            write_interest: false,
        }
    }

    /// The connection's fd, stable for its lifetime and used as its key
    /// and poll token.
    pub fn fd(&self) -> RawFd {
        self.fd
    }

    /// Peer address, for logging.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// The socket as a poll source.
    pub fn source(&mut self) -> &mut TcpStream {
        &mut self.stream
    }

    /// Nickname for display, `*` until one is set (the RFC placeholder
    /// for unregistered connections).
    pub fn nick_or_star(&self) -> &str {
        self.nick.as_deref().unwrap_or("*")
    }

    /// Flip `registered` when all three handshake flags are set.
    /// Returns true on the transition (exactly once per client).
    pub fn try_complete_registration(&mut self) -> bool {
        if !self.registered && self.pass_ok && self.nick_ok && self.user_ok {
            self.registered = true;
            return true;
        }
        false
    }

    /// Queue one line for sending, appending the CRLF terminator.
    pub fn queue_line(&mut self, line: &str) {
        self.send_buf.extend_from_slice(line.as_bytes());
        self.send_buf.extend_from_slice(b"\r\n");
    }

    /// Whether there is unsent output.
    pub fn wants_write(&self) -> bool {
        !self.send_buf.is_empty()
    }

    /// Drain the socket into `recv_buf` until it would block.
    pub fn fill_recv_buf(&mut self) -> ReadOutcome {
        let mut chunk = [0u8; 4096];
        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => return ReadOutcome::Closed,
                Ok(n) => self.recv_buf.extend(&chunk[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return ReadOutcome::Open,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return ReadOutcome::Error(e),
            }
        }
    }

    /// Write as much of `send_buf` as the socket accepts. A partial write
    /// leaves the remainder queued; the caller re-arms write interest.
    pub fn flush_send_buf(&mut self) -> io::Result<()> {
        while !self.send_buf.is_empty() {
            match self.stream.write(&self.send_buf) {
                Ok(0) => return Err(io::ErrorKind::WriteZero.into()),
                Ok(n) => self.send_buf.advance(n),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }
}

/// Build a connected client plus the peer end of its socket.
///
/// Test support: gives unit tests a real non-blocking socket without an
/// event loop.
#[cfg(test)]
pub(crate) fn test_pair() -> (Client, std::net::TcpStream) {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    let peer = std::net::TcpStream::connect(addr).unwrap();
    let (accepted, accepted_addr) = listener.accept().unwrap();
    accepted.set_nonblocking(true).unwrap();
    let client = Client::new(TcpStream::from_std(accepted), accepted_addr);
    (client, peer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read as _;

    #[test]
    fn test_registration_completes_once() {
        let (mut client, _peer) = test_pair();
        assert!(!client.try_complete_registration());

        client.pass_ok = true;
        client.nick_ok = true;
        assert!(!client.try_complete_registration());

        client.user_ok = true;
        assert!(client.try_complete_registration());
        assert!(client.registered);
        // Second call is not a transition.
        assert!(!client.try_complete_registration());
    }

    #[test]
    fn test_nick_or_star() {
        let (mut client, _peer) = test_pair();
        assert_eq!(client.nick_or_star(), "*");
        client.nick = Some("alice".to_owned());
        assert_eq!(client.nick_or_star(), "alice");
    }

    #[test]
    fn test_queue_and_flush() {
        let (mut client, mut peer) = test_pair();
        client.queue_line("PING :token");
        assert!(client.wants_write());

        client.flush_send_buf().unwrap();
        assert!(!client.wants_write());

        let mut got = [0u8; 64];
        let n = peer.read(&mut got).unwrap();
        assert_eq!(&got[..n], b"PING :token\r\n");
    }

    #[test]
    fn test_fill_recv_buf_reads_all_pending() {
        let (mut client, mut peer) = test_pair();
        use std::io::Write as _;
        peer.write_all(b"NICK alice\r\nUSER ").unwrap();

        // Give the kernel a moment to move the bytes across loopback.
        std::thread::sleep(std::time::Duration::from_millis(20));

        assert!(matches!(client.fill_recv_buf(), ReadOutcome::Open));
        assert_eq!(
            client.recv_buf.extract_line().unwrap(),
            Some("NICK alice".to_string())
        );
        assert_eq!(client.recv_buf.extract_line().unwrap(), None);
    }

    #[test]
    fn test_peer_close_detected() {
        let (mut client, peer) = test_pair();
        drop(peer);
        std::thread::sleep(std::time::Duration::from_millis(20));
        assert!(matches!(client.fill_recv_buf(), ReadOutcome::Closed));
    }
}
