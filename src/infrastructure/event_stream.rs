// Chunked newline-delimited JSON streaming of session events
use crate::domain::session::SessionEvent;
use axum::body::Body;
use axum::http::{header, Response, StatusCode};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::stream::Stream;
use futures::StreamExt;
use tokio::sync::broadcast;

/// Build a streaming response from any event stream
pub fn ndjson_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = SessionEvent> + Send + 'static,
{
    let byte_stream = stream.map(encode_event);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(Body::from_stream(byte_stream))
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

/// One event as a JSON line
fn encode_event(event: SessionEvent) -> Result<Bytes, std::io::Error> {
    let json = serde_json::to_vec(&event)?;
    let mut chunk = BytesMut::with_capacity(json.len() + 1);
    chunk.put_slice(&json);
    chunk.put_u8(b'\n');
    Ok(chunk.freeze())
}

/// Stream a broadcast subscription until the publisher goes away
pub fn stream_from_subscription(mut rx: broadcast::Receiver<SessionEvent>) -> impl IntoResponse {
    let stream = async_stream::stream! {
        loop {
            match rx.recv().await {
                Ok(event) => yield event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "event subscriber lagged behind");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    };

    match ndjson_stream(stream) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
