// Chunked newline-delimited JSON streaming of dashboard views
use crate::application::vitals_service::DashboardHandle;
use crate::domain::dashboard::DashboardView;
use axum::body::Body;
use axum::http::{Response, StatusCode, header};
use axum::response::IntoResponse;
use bytes::{BufMut, Bytes, BytesMut};
use futures::StreamExt;
use futures::stream::Stream;

/// Create a chunked response with one JSON document per line
pub fn chunked_json_stream<S>(stream: S) -> Result<Response<Body>, StatusCode>
where
    S: Stream<Item = DashboardView> + Send + 'static,
{
    let byte_stream = stream.map(|view| serialize_chunk(&view));
    let body = Body::from_stream(byte_stream);

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/x-ndjson")
        .header(header::CACHE_CONTROL, "no-cache")
        .body(body)
        .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)
}

fn serialize_chunk(view: &DashboardView) -> Result<Bytes, serde_json::Error> {
    let payload = serde_json::to_vec(view)?;
    let mut chunk = BytesMut::with_capacity(payload.len() + 1);
    chunk.put_slice(&payload);
    chunk.put_u8(b'\n');
    Ok(chunk.freeze())
}

/// The current view, then a fresh one after every state change
pub fn view_updates(handle: DashboardHandle) -> impl Stream<Item = DashboardView> + Send + 'static {
    let mut rx = handle.subscribe();
    async_stream::stream! {
        loop {
            let view = handle.render(&rx.borrow_and_update());
            yield view;
            if rx.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Helper to create a streaming response from a dashboard
pub fn stream_views(handle: DashboardHandle) -> impl IntoResponse {
    match chunked_json_stream(view_updates(handle)) {
        Ok(response) => response,
        Err(status) => status.into_response(),
    }
}
