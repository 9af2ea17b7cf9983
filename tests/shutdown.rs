//! Graceful shutdown: the loop exits on the flag and every socket closes.

mod common;

use common::TestServer;

#[test]
fn test_shutdown_closes_all_client_sockets() {
    let server = TestServer::spawn();
    let mut c1 = server.connect();
    let mut c2 = server.connect();
    c1.register("alice");
    c2.register("bob");

    // Leave some state behind; it dies with the process, not gracefully.
    c1.join("#room");

    server.shutdown();

    c1.assert_closed();
    c2.assert_closed();
}

#[test]
fn test_shutdown_with_no_clients() {
    let server = TestServer::spawn();
    server.shutdown();
}
