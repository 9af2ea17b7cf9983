//! Shared harness for black-box tests: a real server on an ephemeral
//! port, driven by plain TCP clients.

// Each test binary uses a different subset of the harness.
#![allow(dead_code)]

use std::io::{BufRead, BufReader, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use pircd::config::Config;
use pircd::server::Server;

/// The shared password every test server is configured with.
pub const PASSWORD: &str = "secret";

/// A server running on its own thread for the duration of a test.
pub struct TestServer {
    port: u16,
    shutdown: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TestServer {
    /// Bind an ephemeral port and start serving.
    pub fn spawn() -> Self {
        let port = free_port();
        let config = Config::new(port, PASSWORD, "irc.test");
        let mut server = Server::bind(config).expect("failed to bind test server");
        let shutdown = server.shutdown_handle();
        let thread = std::thread::spawn(move || {
            if let Err(e) = server.run() {
                panic!("test server failed: {e}");
            }
        });
        Self {
            port,
            shutdown,
            thread: Some(thread),
        }
    }

    pub fn connect(&self) -> TestClient {
        TestClient::connect(self.port)
    }

    /// Stop the event loop and wait for it to exit: set the shutdown
    /// flag, then open a throwaway connection so the blocking poll
    /// returns and the loop reaches its top-of-iteration check.
    pub fn shutdown(mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            thread.join().expect("server thread panicked");
        }
    }

    fn stop(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
        let _ = TcpStream::connect(("127.0.0.1", self.port));
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.stop();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Reserve an ephemeral port by binding it and letting it go.
fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("failed to bind");
    let port = listener.local_addr().expect("failed to get addr").port();
    drop(listener);
    port
}

/// One TCP client speaking the wire protocol line by line.
pub struct TestClient {
    stream: TcpStream,
    reader: BufReader<TcpStream>,
}

impl TestClient {
    fn connect(port: u16) -> Self {
        let stream = TcpStream::connect(("127.0.0.1", port)).expect("connect failed");
        stream
            .set_read_timeout(Some(Duration::from_secs(5)))
            .expect("set_read_timeout failed");
        stream.set_nodelay(true).expect("set_nodelay failed");
        let reader = BufReader::new(stream.try_clone().expect("try_clone failed"));
        Self { stream, reader }
    }

    /// Send one command line (terminator appended).
    pub fn send_line(&mut self, line: &str) {
        self.stream.write_all(line.as_bytes()).expect("send failed");
        self.stream.write_all(b"\r\n").expect("send failed");
    }

    /// Send raw bytes with no terminator.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.stream.write_all(bytes).expect("send failed");
    }

    /// Receive one line, terminator stripped. Panics on timeout or close.
    pub fn recv_line(&mut self) -> String {
        let mut line = String::new();
        let n = self
            .reader
            .read_line(&mut line)
            .expect("read failed (timeout?)");
        assert!(n > 0, "server closed the connection unexpectedly");
        line.trim_end_matches(['\r', '\n']).to_string()
    }

    /// Read lines until one satisfies the predicate, discarding the rest.
    pub fn recv_until(&mut self, what: &str, pred: impl Fn(&str) -> bool) -> String {
        for _ in 0..200 {
            let line = self.recv_line();
            if pred(&line) {
                return line;
            }
        }
        panic!("gave up waiting for {what}");
    }

    /// Read until a reply with the given three-digit code arrives.
    pub fn expect_numeric(&mut self, code: &str) -> String {
        self.recv_until(code, |l| l.split(' ').nth(1) == Some(code))
    }

    /// Full handshake; consumes the banner, welcome, and help burst.
    pub fn register(&mut self, nick: &str) {
        self.send_line(&format!("PASS {PASSWORD}"));
        self.send_line(&format!("NICK {nick}"));
        self.send_line(&format!("USER {nick} 0 * :{nick}"));
        self.expect_numeric("001");
        self.expect_numeric("706");
    }

    /// Join a channel and consume the join burst (through `366`).
    pub fn join(&mut self, channel: &str) {
        self.send_line(&format!("JOIN {channel}"));
        self.expect_numeric("366");
    }

    /// Assert the server closed this connection (EOF or reset, not a
    /// timeout).
    pub fn assert_closed(&mut self) {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {}
            Ok(_) => panic!("expected close, got line: {line:?}"),
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                panic!("expected close, timed out instead")
            }
            Err(_) => {} // reset also means closed
        }
    }
}
