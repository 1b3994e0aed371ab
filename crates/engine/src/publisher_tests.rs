// SPDX-License-Identifier: MIT

use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use super::*;

#[tokio::test]
async fn drains_queued_events_and_publishes_them() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = tokio::spawn(async move {
        let (mut sock, _) = listener.accept().await.unwrap();
        jrw_bus::wire::read_frame(&mut sock).await.unwrap().unwrap()
    });

    let (tx, rx) = crate::events::channel();
    let rx = crate::events::shared(rx);
    let shutdown = CancellationToken::new();

    let event = jrw_core::EventEnvelope::run(jrw_core::EventKind::Started, 7);
    tx.send(event.clone()).unwrap();

    let publisher_handle = tokio::spawn(run_publisher(addr.to_string(), rx, shutdown.clone()));

    let frame = server.await.unwrap();
    assert_eq!(frame.topic, EVENT_TOPIC);
    assert_eq!(frame.payload, serde_json::to_value(&event).unwrap());

    shutdown.cancel();
    drop(tx);
    let _ = publisher_handle.await;
}
