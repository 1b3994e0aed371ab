// SPDX-License-Identifier: MIT

use std::time::Duration;

use serde_json::json;
use tokio::net::TcpListener;

use super::*;

#[tokio::test]
async fn subscribe_sends_handshake_then_receives_matching_frame() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let handshake = wire::read_frame(&mut sock).await.unwrap().unwrap();
        assert_eq!(handshake.topic, "subscribe");
        assert_eq!(handshake.payload, json!("master.broadcast.key123"));

        wire::write_frame(&mut sock, &Frame::new("unrelated.topic", json!(1))).await.unwrap();
        wire::write_frame(&mut sock, &Frame::new("master.broadcast.key123", json!({"action": "enqueue", "run_id": 1}))).await.unwrap();
    });

    let mut subscriber = Subscriber::connect(&addr.to_string(), "master.broadcast.key123").await.unwrap();
    let payload = subscriber.recv().await.unwrap().unwrap();
    assert_eq!(payload, json!({"action": "enqueue", "run_id": 1}));

    server.await.unwrap();
}

#[tokio::test]
async fn recv_timeout_reports_timeout_while_connection_stays_open() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let _handshake = wire::read_frame(&mut sock).await.unwrap().unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        drop(sock);
    });

    let mut subscriber = Subscriber::connect(&addr.to_string(), "t").await.unwrap();
    let result = subscriber.recv_timeout(Duration::from_millis(50)).await.unwrap();
    assert!(matches!(result, Recv::Timeout));

    server.abort();
}

#[tokio::test]
async fn recv_timeout_reports_closed_on_eof() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        let _handshake = wire::read_frame(&mut sock).await.unwrap().unwrap();
        drop(sock);
    });

    let mut subscriber = Subscriber::connect(&addr.to_string(), "t").await.unwrap();
    let result = subscriber.recv_timeout(Duration::from_secs(2)).await.unwrap();
    assert!(matches!(result, Recv::Closed));

    server.await.unwrap();
}
