//! The socket façade.
//!
//! [`Listener`] owns the listening socket and hides the platform sequence
//! behind four failure kinds: create, bind, listen, accept. The socket is
//! built with `socket2` so each step is explicit (and individually
//! attributable when it fails), then handed to `mio` for readiness
//! registration. Ownership is move-only and dropping the listener closes
//! the descriptor exactly once — both guaranteed by the type system.

use std::io;
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};

use mio::event::Source;
use mio::net::{TcpListener, TcpStream};
use mio::{Interest, Registry, Token};
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;

/// Listen backlog. Modest; pending connections beyond this are queued or
/// refused by the kernel.
const BACKLOG: i32 = 16;

/// Socket façade errors, each carrying the underlying OS error.
#[derive(Debug, Error)]
pub enum SocketError {
    #[error("socket creation failed: {0}")]
    CreateFailed(#[source] io::Error),

    #[error("bind to port {port} failed: {source}")]
    BindFailed {
        port: u16,
        #[source]
        source: io::Error,
    },

    #[error("listen failed: {0}")]
    ListenFailed(#[source] io::Error),

    #[error("accept failed: {0}")]
    AcceptFailed(#[source] io::Error),
}

/// An owned, non-blocking listening socket.
#[derive(Debug)]
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Create a listening socket on IPv4 ANY at the given port.
    ///
    /// The socket is created non-blocking with `SO_REUSEADDR`, bound, and
    /// put into listening state before this returns.
    pub fn bind(port: u16) -> Result<Self, SocketError> {
        let socket = Socket::new(Domain::IPV4, Type::STREAM, Some(Protocol::TCP))
            .map_err(SocketError::CreateFailed)?;
        socket
            .set_reuse_address(true)
            .map_err(SocketError::CreateFailed)?;
        socket
            .set_nonblocking(true)
            .map_err(SocketError::CreateFailed)?;

        let addr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::UNSPECIFIED, port));
        socket
            .bind(&addr.into())
            .map_err(|source| SocketError::BindFailed { port, source })?;
        socket.listen(BACKLOG).map_err(SocketError::ListenFailed)?;

        let std_listener: std::net::TcpListener = socket.into();
        Ok(Self {
            inner: TcpListener::from_std(std_listener),
        })
    }

    /// Accept one pending connection.
    ///
    /// Returns `Ok(None)` when the call would block or the connection was
    /// aborted before we got to it; those are not errors, just an empty
    /// accept queue. The returned stream is already non-blocking.
    pub fn accept(&mut self) -> Result<Option<(TcpStream, SocketAddr)>, SocketError> {
        match self.inner.accept() {
            Ok((stream, addr)) => Ok(Some((stream, addr))),
            Err(e)
                if e.kind() == io::ErrorKind::WouldBlock
                    || e.kind() == io::ErrorKind::Interrupted
                    || e.raw_os_error() == Some(libc::ECONNABORTED) =>
            {
                Ok(None)
            }
            Err(e) => Err(SocketError::AcceptFailed(e)),
        }
    }

    /// Local address the socket is bound to.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.inner.local_addr()
    }
}

impl Source for Listener {
    fn register(&mut self, registry: &Registry, token: Token, interests: Interest) -> io::Result<()> {
        self.inner.register(registry, token, interests)
    }

    fn reregister(
        &mut self,
        registry: &Registry,
        token: Token,
        interests: Interest,
    ) -> io::Result<()> {
        self.inner.reregister(registry, token, interests)
    }

    fn deregister(&mut self, registry: &Registry) -> io::Result<()> {
        self.inner.deregister(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_accept_nonblocking() {
        let mut listener = Listener::bind(0).unwrap_or_else(|e| panic!("bind failed: {e}"));
        // Port 0 is only used here to get an ephemeral port for the test;
        // the config layer rejects it for real servers.
        let addr = listener.local_addr().unwrap();
        assert_ne!(addr.port(), 0);

        // Nothing pending: accept must not block.
        assert!(listener.accept().unwrap().is_none());

        // A real connection is surfaced.
        let _peer = std::net::TcpStream::connect(addr).unwrap();
        let accepted = loop {
            if let Some(pair) = listener.accept().unwrap() {
                break pair;
            }
        };
        assert_eq!(accepted.1.ip(), addr.ip());
    }

    #[test]
    fn test_bind_conflict_reports_bind_failed() {
        let first = Listener::bind(0).unwrap();
        let port = first.local_addr().unwrap().port();
        // SO_REUSEADDR does not allow two live listeners on the same port.
        match Listener::bind(port) {
            Err(SocketError::BindFailed { port: p, .. }) => assert_eq!(p, port),
            other => panic!("expected BindFailed, got {other:?}"),
        }
    }
}
