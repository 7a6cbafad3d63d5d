//! Drives `run_connection` against an in-process WebSocket peer.

use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use stream_viewer::{
    data::PointCloud,
    net::run_connection,
    stream::{self, ConnectionState, EventSink},
};
use tokio::net::TcpListener;
use tokio_tungstenite::{accept_async, tungstenite::Message};

#[derive(Debug, Clone, PartialEq)]
enum Event {
    State(ConnectionState),
    Points(Vec<f32>),
}

/// Keeps every event in arrival order.
#[derive(Default)]
struct Recorder {
    events: Mutex<Vec<Event>>,
}

impl Recorder {
    fn events(&self) -> Vec<Event> {
        self.events.lock().clone()
    }

    fn payloads(&self) -> Vec<Vec<f32>> {
        self.events()
            .into_iter()
            .filter_map(|ev| match ev {
                Event::Points(p) => Some(p),
                Event::State(_) => None,
            })
            .collect()
    }
}

impl EventSink for Recorder {
    fn state(&self, state: ConnectionState) {
        self.events.lock().push(Event::State(state));
    }

    fn points(&self, vertices: Vec<f32>) -> bool {
        self.events.lock().push(Event::Points(vertices));
        true
    }
}

/// Accepts one client, records the first frame it sends, replies with
/// `replies` and closes the socket.
async fn serve_once(replies: Vec<Message>) -> (String, tokio::task::JoinHandle<Message>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());

    let server = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let mut ws = accept_async(tcp).await.unwrap();

        let first = ws.next().await.unwrap().unwrap();
        for reply in replies {
            ws.send(reply).await.unwrap();
        }
        ws.close(None).await.unwrap();
        first
    });

    (url, server)
}

fn text(s: &str) -> Message {
    Message::Text(s.to_owned())
}

#[tokio::test]
async fn requests_data_then_streams_until_close() {
    let (url, server) = serve_once(vec![
        text("[[1, 2, 3], [4, 5, 6]]"),
        text("[]"),
    ])
    .await;

    let sink = Recorder::default();
    run_connection(&url, "request_data", &sink).await.unwrap();

    assert_eq!(server.await.unwrap(), text("request_data"));

    assert_eq!(
        sink.events(),
        vec![
            Event::State(ConnectionState::Connecting),
            Event::State(ConnectionState::Open),
            Event::State(ConnectionState::Streaming),
            Event::Points(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
            Event::Points(vec![]),
            Event::State(ConnectionState::Closed),
        ]
    );
}

#[tokio::test]
async fn malformed_payloads_are_skipped() {
    let (url, server) = serve_once(vec![
        text("not json"),
        text("[[1, 2]]"),
        Message::Binary(vec![0xff, 0xfe, 0xfd]),
        Message::Binary(b"[[7, 8, 9]]".to_vec()),
        text("{\"points\": []}"),
        text("[[0.5, 0.5, 0.5]]"),
    ])
    .await;

    let sink = Recorder::default();
    run_connection(&url, "request_data", &sink).await.unwrap();
    server.await.unwrap();

    assert_eq!(
        sink.payloads(),
        vec![vec![7.0, 8.0, 9.0], vec![0.5, 0.5, 0.5]]
    );
}

#[tokio::test]
async fn frames_keep_only_the_latest_payload() {
    let (url, server) = serve_once(vec![
        text("[[1, 1, 1]]"),
        text("[[2, 2, 2], [3, 3, 3]]"),
        text("[[4, 4, 4]]"),
    ])
    .await;

    let (tx, mut inbox) = stream::channel();
    run_connection(&url, "request_data", &tx).await.unwrap();
    server.await.unwrap();

    let mut cloud = PointCloud::new();
    assert!(inbox.drain_into(&mut cloud));

    assert_eq!(cloud.vertices(), &[4.0, 4.0, 4.0]);
    assert_eq!(inbox.messages(), 3);
    assert_eq!(inbox.state(), &ConnectionState::Closed);
}

#[tokio::test]
async fn custom_request_token_is_sent() {
    let (url, server) = serve_once(vec![]).await;

    let sink = Recorder::default();
    run_connection(&url, "subscribe", &sink).await.unwrap();

    assert_eq!(server.await.unwrap(), text("subscribe"));
}

#[tokio::test]
async fn refused_connection_fails_without_retry() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!("ws://{}/ws", listener.local_addr().unwrap());
    drop(listener);

    let sink = Recorder::default();
    assert!(run_connection(&url, "request_data", &sink).await.is_err());

    let events = sink.events();
    assert_eq!(events.len(), 2);
    assert_eq!(events[0], Event::State(ConnectionState::Connecting));
    assert!(matches!(events[1], Event::State(ConnectionState::Failed(_))));
}

#[tokio::test]
async fn clouds_larger_than_a_default_frame_arrive_whole() {
    const POINTS: usize = 2_200_000;

    // "[0,0,0]," per point: a little over 17.6 MB, past tungstenite's 16 MiB frame default.
    let mut payload = String::with_capacity(POINTS * 8 + 1);
    payload.push('[');
    for i in 0..POINTS {
        if i > 0 {
            payload.push(',');
        }
        payload.push_str("[0,0,0]");
    }
    payload.push(']');
    assert!(payload.len() > 16 << 20);

    let (url, server) = serve_once(vec![Message::Text(payload)]).await;

    let sink = Recorder::default();
    run_connection(&url, "request_data", &sink).await.unwrap();
    server.await.unwrap();

    let points = sink.payloads();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].len(), POINTS * 3);
    assert_eq!(
        sink.events().last(),
        Some(&Event::State(ConnectionState::Closed))
    );
}
