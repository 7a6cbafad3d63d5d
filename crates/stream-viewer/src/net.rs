use crate::{
    data::decode_points,
    error::StreamError,
    stream::{ConnectionState, EventSink, StreamSender},
};
use futures_util::{SinkExt, StreamExt};
use std::thread;
use tokio_tungstenite::{
    connect_async_with_config,
    tungstenite::{protocol::WebSocketConfig, Message},
};

/// A full cloud arrives as a single message, so no size cap applies to it.
fn socket_config() -> WebSocketConfig {
    WebSocketConfig {
        max_message_size: None,
        max_frame_size: None,
        ..Default::default()
    }
}

/// Runs the stream connection on its own thread with a current-thread runtime.
pub fn spawn_network(url: String, request: String, tx: StreamSender) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let rt = match tokio::runtime::Builder::new_current_thread()
            .enable_io()
            .enable_time()
            .build()
        {
            Ok(rt) => rt,
            Err(e) => {
                log::error!("Failed to start network runtime: {}", e);
                tx.state(ConnectionState::Failed(e.to_string()));
                return;
            }
        };

        rt.block_on(async move {
            match run_connection(&url, &request, &tx).await {
                Ok(()) => log::info!("Network thread completed normally"),
                Err(e) => log::error!("Network thread error: {}", e),
            }
        });
    })
}

/// Connects to `url`, sends `request` once, then forwards every decodable
/// point payload to `sink` until the server closes the socket. Payloads of
/// any size are accepted.
///
/// Undecodable payloads are logged and skipped. There is no reconnect: the
/// function returns after `Closed` or `Failed` has been emitted.
pub async fn run_connection(
    url: &str,
    request: &str,
    sink: &impl EventSink,
) -> Result<(), StreamError> {
    sink.state(ConnectionState::Connecting);

    let connecting = connect_async_with_config(url, Some(socket_config()), false);
    let (mut ws, _response) = match connecting.await {
        Ok(conn) => conn,
        Err(e) => return Err(fail(sink, e.into())),
    };
    log::info!("WebSocket connection opened: {}", url);
    sink.state(ConnectionState::Open);

    if let Err(e) = ws.send(Message::Text(request.to_owned())).await {
        return Err(fail(sink, e.into()));
    }

    let mut streaming = false;

    while let Some(msg) = ws.next().await {
        let payload = match msg {
            Ok(Message::Text(text)) => text,
            Ok(Message::Binary(bytes)) => match String::from_utf8(bytes) {
                Ok(text) => text,
                Err(e) => {
                    log::warn!("{}", StreamError::Binary(e.as_bytes().len()));
                    continue;
                }
            },
            Ok(Message::Close(frame)) => {
                log::info!("WebSocket connection closed: {:?}", frame);
                break;
            }
            // Ping/pong are answered by tungstenite.
            Ok(_) => continue,
            Err(e) => return Err(fail(sink, e.into())),
        };

        let vertices = match decode_points(&payload) {
            Ok(vertices) => vertices,
            Err(e) => {
                log::warn!("Dropping message ({} bytes): {}", payload.len(), e);
                continue;
            }
        };

        log::debug!("Received {} points", vertices.len() / 3);

        if !streaming {
            streaming = true;
            sink.state(ConnectionState::Streaming);
        }

        if !sink.points(vertices) {
            log::info!("Viewer is gone; leaving stream");
            return Ok(());
        }
    }

    sink.state(ConnectionState::Closed);
    Ok(())
}

fn fail(sink: &impl EventSink, err: StreamError) -> StreamError {
    log::error!("WebSocket error: {}", err);
    sink.state(ConnectionState::Failed(err.to_string()));
    err
}
