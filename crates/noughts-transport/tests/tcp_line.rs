//! Integration tests for the newline-delimited TCP transport.

use noughts_transport::{Connection, TcpLineTransport, Transport, TransportError, MAX_LINE_BYTES};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

async fn accept_pair() -> (noughts_transport::TcpLineConnection, TcpStream) {
    let mut transport = TcpLineTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport.local_addr().expect("bound address");

    let server = tokio::spawn(async move { transport.accept().await.expect("should accept") });
    let client = TcpStream::connect(addr).await.expect("client should connect");
    let conn = server.await.expect("accept task");
    (conn, client)
}

#[tokio::test]
async fn test_tcp_send_appends_newline() {
    let (conn, client) = accept_pair().await;
    conn.send(br#"{"type":"ERROR"}"#).await.expect("send");

    let mut lines = BufReader::new(client).lines();
    let line = lines.next_line().await.expect("read").expect("a line");
    assert_eq!(line, r#"{"type":"ERROR"}"#);
}

#[tokio::test]
async fn test_tcp_recv_splits_lines_and_skips_blank_ones() {
    let (conn, mut client) = accept_pair().await;
    client.write_all(b"first\r\n\nsecond\n").await.expect("write");

    assert_eq!(conn.recv().await.expect("recv"), Some(b"first".to_vec()));
    assert_eq!(conn.recv().await.expect("recv"), Some(b"second".to_vec()));
}

#[tokio::test]
async fn test_tcp_recv_returns_none_on_client_close() {
    let (conn, client) = accept_pair().await;
    drop(client);
    assert!(conn.recv().await.expect("recv should not error").is_none());
}

#[tokio::test]
async fn test_tcp_recv_rejects_oversized_line() {
    let (conn, mut client) = accept_pair().await;
    let big = vec![b'a'; MAX_LINE_BYTES + 10];
    tokio::spawn(async move {
        let _ = client.write_all(&big).await;
        let _ = client.write_all(b"\n").await;
        // keep the socket open until the server has read
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    });

    let err = conn.recv().await.expect_err("line is too long");
    assert!(matches!(err, TransportError::FrameTooLarge(_)));
}

#[tokio::test]
async fn test_tcp_send_while_recv_pending() {
    let (conn, client) = accept_pair().await;
    let conn = std::sync::Arc::new(conn);

    let reader = {
        let conn = std::sync::Arc::clone(&conn);
        tokio::spawn(async move { conn.recv().await })
    };
    tokio::task::yield_now().await;

    // The reader holds the read half, the write half stays free.
    conn.send(b"ping").await.expect("send");
    let (read, mut write) = client.into_split();
    let mut lines = BufReader::new(read).lines();
    assert_eq!(lines.next_line().await.expect("read").as_deref(), Some("ping"));

    write.write_all(b"pong\n").await.expect("write");
    let got = reader.await.expect("join").expect("recv");
    assert_eq!(got, Some(b"pong".to_vec()));
}
