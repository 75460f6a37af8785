//! Integration tests for the websocket narration channel

use crate::test_utils::{capex_fixture, test_runtime, tickers, wait_for_terminal};
use capex_trail::core::http::{create_router, AppState};
use capex_trail::core::runtime::Runtime;
use futures_util::StreamExt;
use std::net::SocketAddr;
use std::time::Duration;
use tokio_tungstenite::{connect_async, tungstenite::Message};

async fn serve(runtime: Runtime) -> SocketAddr {
    let app = create_router(AppState::new(runtime));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

async fn wait_for_subscribers(runtime: &Runtime, id: &str, expected: usize) {
    for _ in 0..500 {
        if runtime.broadcast.subscriber_count(id) == expected {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {} live subscribers for {}", expected, id);
}

#[tokio::test]
async fn websocket_stream_matches_persisted_logs() {
    let runtime = test_runtime(capex_fixture());
    let addr = serve(runtime.clone()).await;

    let job = runtime
        .runner
        .prepare(Some(tickers(&["AAA", "BBB"])))
        .await
        .unwrap();
    let (mut socket, _) = connect_async(format!("ws://{}/ws/{}", addr, job.id))
        .await
        .expect("websocket handshake");
    wait_for_subscribers(&runtime, &job.id, 1).await;

    let _ = runtime.runner.launch(job.clone());

    let mut received = Vec::new();
    loop {
        let frame = tokio::time::timeout(Duration::from_secs(5), socket.next())
            .await
            .expect("narration frame")
            .expect("open stream")
            .expect("valid frame");
        if let Message::Text(text) = frame {
            let done = text.starts_with("Analysis complete");
            received.push(text);
            if done {
                break;
            }
        }
    }

    wait_for_terminal(runtime.store.as_ref(), &job.id).await;
    let persisted: Vec<String> = runtime
        .store
        .list_logs(&job.id)
        .await
        .unwrap()
        .into_iter()
        .map(|l| l.message)
        .collect();
    assert_eq!(received, persisted);
}

#[tokio::test]
async fn closing_the_socket_detaches_the_subscriber() {
    let runtime = test_runtime(capex_fixture());
    let addr = serve(runtime.clone()).await;

    let (mut socket, _) = connect_async(format!("ws://{}/ws/some-job", addr))
        .await
        .expect("websocket handshake");
    wait_for_subscribers(&runtime, "some-job", 1).await;
    assert_eq!(runtime.metrics.live_subscribers.get(), 1);

    socket.close(None).await.unwrap();
    wait_for_subscribers(&runtime, "some-job", 0).await;
    assert_eq!(runtime.metrics.live_subscribers.get(), 0);
}

#[tokio::test]
async fn subscribers_of_other_jobs_receive_nothing() {
    let runtime = test_runtime(capex_fixture());
    let addr = serve(runtime.clone()).await;

    let (mut socket, _) = connect_async(format!("ws://{}/ws/unrelated", addr))
        .await
        .expect("websocket handshake");
    wait_for_subscribers(&runtime, "unrelated", 1).await;

    let job = runtime
        .runner
        .prepare(Some(tickers(&["AAA"])))
        .await
        .unwrap();
    runtime.runner.launch(job.clone()).await.unwrap();

    let frame = tokio::time::timeout(Duration::from_millis(200), socket.next()).await;
    assert!(frame.is_err(), "unexpected frame {:?}", frame);
}
