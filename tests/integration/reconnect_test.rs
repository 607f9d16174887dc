//! Reconnect behavior against a local WebSocket server

use flow_tape::config::Config;
use flow_tape::service::FlowService;
use flow_tape::source::WsFlowSource;
use flow_tape::ws::{ConnectionState, Immediate, WsClient, WsConfig, WsMessage};
use futures_util::SinkExt;
use std::time::Duration;
use tempfile::TempDir;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;

/// Server that sends one flow event per connection and then closes it
async fn spawn_closing_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut connection = 0;
        while let Ok((stream, _)) = listener.accept().await {
            connection += 1;
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            let frame = format!(
                r#"{{"symbol":"CONN{}","price":1,"quantity":1,"side":"buy"}}"#,
                connection
            );
            let _ = ws.send(Message::Text(frame)).await;
            let _ = ws.close(None).await;
        }
    });

    format!("ws://{}", addr)
}

#[tokio::test]
async fn test_pipeline_survives_server_closes() {
    let url = spawn_closing_server().await;
    let dir = TempDir::new().unwrap();

    let mut config = Config::default();
    config.log.path = dir.path().join("flow.csv");

    let source = WsFlowSource::new(WsConfig::new(url).reconnect_policy(Immediate));
    let service = FlowService::start(&config, &source).await.unwrap();
    let reader = service.reader();

    tokio::time::timeout(Duration::from_secs(10), async {
        while reader.recent_rows(10).await.len() < 3 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("pipeline did not reconnect");

    // The server keeps accepting, so more rows may land after the wait; check the oldest three
    let rows = reader.recent_rows(usize::MAX).await;
    let symbols: Vec<&str> = rows.iter().take(3).map(|r| r.symbol.as_str()).collect();
    assert_eq!(symbols, vec!["CONN1", "CONN2", "CONN3"]);

    let stats = service.stats().await;
    assert!(stats.connects >= 3);
    assert!(stats.disconnects >= 2);
    service.shutdown();
}

#[tokio::test]
async fn test_state_returns_to_connecting_after_close() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (accepted_tx, mut accepted_rx) = mpsc::channel::<usize>(8);
    let (close_tx, mut close_rx) = mpsc::channel::<()>(1);

    tokio::spawn(async move {
        let mut count = 0;
        while let Ok((stream, _)) = listener.accept().await {
            count += 1;
            let Ok(mut ws) = tokio_tungstenite::accept_async(stream).await else {
                continue;
            };
            let _ = accepted_tx.send(count).await;
            if count == 1 {
                // Hold the first connection open until told to drop it
                let _ = close_rx.recv().await;
                let _ = ws.close(None).await;
            } else {
                // Keep later connections open
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    drop(ws);
                });
            }
        }
    });

    let client = WsClient::new(
        WsConfig::new(format!("ws://{}", addr)).reconnect_policy(Immediate),
    );
    let mut state = client.state();
    let mut messages = client.connect();

    state
        .wait_for(|s| *s == ConnectionState::Connected)
        .await
        .unwrap();
    assert_eq!(accepted_rx.recv().await, Some(1));

    close_tx.send(()).await.unwrap();

    // The client reports the close and goes back to connecting on its own
    let mut saw_disconnect = false;
    let mut saw_reconnecting = false;
    tokio::time::timeout(Duration::from_secs(10), async {
        while let Some(msg) = messages.recv().await {
            match msg {
                WsMessage::Disconnected => saw_disconnect = true,
                WsMessage::Reconnecting { attempt } => {
                    assert_eq!(attempt, 1);
                    saw_reconnecting = true;
                }
                WsMessage::Connected if saw_reconnecting => break,
                _ => {}
            }
        }
    })
    .await
    .expect("client did not reconnect");

    assert!(saw_disconnect);
    assert!(saw_reconnecting);
    assert_eq!(accepted_rx.recv().await, Some(2));
}
