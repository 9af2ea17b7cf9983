//! The event loop.
//!
//! One thread, one `mio::Poll`, no locks. Every fd is registered with the
//! poll instance — the listener under a sentinel token, each client under
//! its own fd — and the loop blocks only in `poll()`. Handlers run to
//! completion between readiness returns; everything they queue is flushed
//! at the end of the iteration, with write interest armed only for
//! clients whose output did not fit the socket buffer.

use std::io;
use std::os::fd::RawFd;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use mio::{Events, Interest, Poll, Token};
use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::config::Config;
use crate::handlers::{self, helpers, Action};
use crate::net::{Listener, SocketError};
use crate::signals;
use crate::state::{Client, ReadOutcome, ServerState};

/// Poll token for the listening socket. Client tokens are their fds, which
/// can never reach this value.
const LISTENER: Token = Token(usize::MAX);

/// Lines sent to every connection before registration.
const BANNER: &[&str] = &[
    "*** Welcome to pircd",
    "*** Register with PASS <password>, then NICK <nick> and USER <user> 0 * :<realname>",
];

/// Fatal server errors. Per-client problems never surface here; they end
/// the client, not the server.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error(transparent)]
    Socket(#[from] SocketError),

    #[error("event loop I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("fatal error event on the listening socket")]
    ListenerFailed,
}

/// The server: listener, poll instance, and the state tables.
pub struct Server {
    poll: Poll,
    listener: Listener,
    state: ServerState,
    shutdown: Arc<AtomicBool>,
}

impl Server {
    /// Bind the listening socket and set up polling. The server is not
    /// serving until [`Server::run`] is called.
    pub fn bind(config: Config) -> Result<Self, ServerError> {
        let mut listener = Listener::bind(config.port)?;
        let poll = Poll::new()?;
        poll.registry()
            .register(&mut listener, LISTENER, Interest::READABLE)?;

        info!(port = config.port, host = %config.host, "server listening");
        Ok(Self {
            poll,
            listener,
            state: ServerState::new(config),
            shutdown: Arc::new(AtomicBool::new(false)),
        })
    }

    /// A handle that stops this instance from another thread, equivalent
    /// to (but independent of) the process-wide signal flag.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run until a termination signal or the shutdown handle fires.
    ///
    /// On exit every socket is closed by drop; no farewell traffic is
    /// sent.
    pub fn run(&mut self) -> Result<(), ServerError> {
        let mut events = Events::with_capacity(256);

        loop {
            if signals::shutdown_requested() || self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, exiting event loop");
                return Ok(());
            }

            if let Err(e) = self.poll.poll(&mut events, None) {
                // A signal interrupting the wait is routine; the check at
                // the top of the loop decides whether it was termination.
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(ServerError::Io(e));
            }

            for event in events.iter() {
                match event.token() {
                    LISTENER => {
                        if event.is_error() {
                            return Err(ServerError::ListenerFailed);
                        }
                        self.accept_pending();
                    }
                    Token(fd) => self.handle_client_event(fd as RawFd, event),
                }
            }

            self.flush_and_sync_interest();
        }
    }

    /// Accept until the backlog is drained.
    fn accept_pending(&mut self) {
        loop {
            match self.listener.accept() {
                Ok(Some((stream, addr))) => {
                    let mut client = Client::new(stream, addr);
                    let fd = client.fd();
                    if let Err(e) = self.poll.registry().register(
                        client.source(),
                        Token(fd as usize),
                        Interest::READABLE,
                    ) {
                        warn!(fd, error = %e, "failed to register new connection");
                        continue; // drop closes the socket
                    }

                    info!(fd, peer = %addr, "connection accepted");
                    self.state.clients.insert(fd, client);
                    for line in BANNER {
                        let notice = helpers::server_notice(self.state.host(), "*", line);
                        self.state.send_to(fd, &notice);
                    }
                }
                Ok(None) => return,
                Err(e) => {
                    warn!(error = %e, "accept failed");
                    return;
                }
            }
        }
    }

    /// React to one readiness event for one client fd.
    ///
    /// The fd may have been disconnected earlier in this same event batch;
    /// the table lookup makes such stale events no-ops.
    fn handle_client_event(&mut self, fd: RawFd, event: &mio::event::Event) {
        if !self.state.clients.contains_key(&fd) {
            return;
        }

        if event.is_error() || event.is_read_closed() {
            self.disconnect(fd, "connection closed by peer");
            return;
        }

        if event.is_readable() {
            self.handle_readable(fd);
        }

        if event.is_writable() {
            if let Some(client) = self.state.clients.get_mut(&fd) {
                if let Err(e) = client.flush_send_buf() {
                    warn!(fd, error = %e, "send failed");
                    self.disconnect(fd, "send failure");
                }
            }
        }
    }

    /// Drain the socket, then frame/parse/dispatch every complete line.
    fn handle_readable(&mut self, fd: RawFd) {
        let outcome = match self.state.clients.get_mut(&fd) {
            Some(client) => client.fill_recv_buf(),
            None => return,
        };
        match outcome {
            ReadOutcome::Open => {}
            ReadOutcome::Closed => {
                self.disconnect(fd, "peer closed connection");
                return;
            }
            ReadOutcome::Error(e) => {
                warn!(fd, error = %e, "recv failed");
                self.disconnect(fd, "recv failure");
                return;
            }
        }

        loop {
            let line = match self.state.clients.get_mut(&fd) {
                Some(client) => match client.recv_buf.extract_line() {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(violation) => {
                        warn!(fd, error = %violation, "protocol violation");
                        self.disconnect(fd, "protocol violation");
                        return;
                    }
                },
                None => return,
            };

            if line.is_empty() {
                continue;
            }
            trace!(fd, line = %line, "dispatching");

            let msg = pirc_proto::Message::parse(&line);
            match handlers::dispatch(&mut self.state, fd, &msg) {
                Action::Continue => {}
                Action::Disconnect => {
                    self.disconnect(fd, "quit");
                    return;
                }
            }
        }
    }

    /// Tear a client down: out of every channel first, then out of the
    /// table and the poll set. Dropping the client closes its socket.
    fn disconnect(&mut self, fd: RawFd, reason: &str) {
        self.state.drop_from_channels(fd);
        if let Some(mut client) = self.state.clients.remove(&fd) {
            let _ = self.poll.registry().deregister(client.source());
            info!(fd, nick = %client.nick_or_star(), reason, "client disconnected");
        }
    }

    /// Try to push queued output out now; arm write interest only for
    /// clients the socket pushed back on.
    fn flush_and_sync_interest(&mut self) {
        let mut failed: Vec<RawFd> = Vec::new();

        for (&fd, client) in self.state.clients.iter_mut() {
            if client.wants_write() {
                if let Err(e) = client.flush_send_buf() {
                    warn!(fd, error = %e, "send failed");
                    failed.push(fd);
                    continue;
                }
            }

            let want_write = client.wants_write();
            if want_write != client.write_interest {
                let interest = if want_write {
                    debug!(fd, "output backlogged, enabling write interest");
                    Interest::READABLE | Interest::WRITABLE
                } else {
                    Interest::READABLE
                };
                match self.poll.registry().reregister(
                    client.source(),
                    Token(fd as usize),
                    interest,
                ) {
                    Ok(()) => client.write_interest = want_write,
                    Err(e) => {
                        warn!(fd, error = %e, "reregister failed");
                        failed.push(fd);
                    }
                }
            }
        }

        for fd in failed {
            self.disconnect(fd, "send failure");
        }
    }
}
