//! HTTP response building module
//!
//! Builders for the few responses the host server produces around the
//! static resource layer.

use std::io;

use futures::TryStreamExt;
use http_body_util::combinators::UnsyncBoxBody;
use http_body_util::{BodyExt, Full, StreamBody};
use hyper::body::{Bytes, Frame};
use hyper::{Response, StatusCode};
use tokio_util::io::ReaderStream;

use crate::resource::ByteStream;

/// Response body: either a fixed buffer or a streamed resource
pub type HttpBody = UnsyncBoxBody<Bytes, io::Error>;
pub type HttpResponse = Response<HttpBody>;

fn full(bytes: Bytes) -> HttpBody {
    Full::new(bytes).map_err(|never| match never {}).boxed_unsync()
}

/// Plain-text response with a fixed status
fn build_text_response(status: StatusCode, text: &'static str) -> HttpResponse {
    Response::builder()
        .status(status)
        .header("Content-Type", "text/plain")
        .body(full(Bytes::from_static(text.as_bytes())))
        .unwrap_or_else(|e| {
            log_build_error(status, &e);
            Response::new(full(Bytes::from_static(text.as_bytes())))
        })
}

/// 200 response streaming a consumed static resource.
/// A read failure mid-stream is logged and aborts the body.
pub fn build_resource_response(
    stream: ByteStream,
    size: Option<u64>,
    location: String,
) -> HttpResponse {
    let frames = ReaderStream::new(stream)
        .map_ok(Frame::data)
        .map_err(move |e| {
            crate::logger::log_error(&format!("Streaming '{location}' failed: {e}"));
            e
        });
    resource_response(StreamBody::new(frames).boxed_unsync(), size)
}

/// 200 response for HEAD: no body, `Content-Length` when known
pub fn build_head_response(size: Option<u64>) -> HttpResponse {
    resource_response(full(Bytes::new()), size)
}

fn resource_response(body: HttpBody, size: Option<u64>) -> HttpResponse {
    let mut builder = Response::builder().status(StatusCode::OK);
    if let Some(len) = size {
        builder = builder.header("Content-Length", len);
    }
    builder.body(body).unwrap_or_else(|e| {
        log_build_error(StatusCode::OK, &e);
        Response::new(full(Bytes::new()))
    })
}

pub fn build_health_response(status: &'static str) -> HttpResponse {
    build_text_response(StatusCode::OK, status)
}

pub fn build_404_response() -> HttpResponse {
    build_text_response(StatusCode::NOT_FOUND, "404 Not Found")
}

pub fn build_405_response() -> HttpResponse {
    let mut response = build_text_response(StatusCode::METHOD_NOT_ALLOWED, "405 Method Not Allowed");
    response
        .headers_mut()
        .insert("Allow", hyper::header::HeaderValue::from_static("GET, HEAD, OPTIONS"));
    response
}

/// Build OPTIONS response
pub fn build_options_response() -> HttpResponse {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Allow", "GET, HEAD, OPTIONS")
        .body(full(Bytes::new()))
        .unwrap_or_else(|e| {
            log_build_error(StatusCode::NO_CONTENT, &e);
            Response::new(full(Bytes::new()))
        })
}

pub fn build_500_response() -> HttpResponse {
    build_text_response(StatusCode::INTERNAL_SERVER_ERROR, "500 Internal Server Error")
}

/// Log response build error
fn log_build_error(status: StatusCode, error: &hyper::http::Error) {
    crate::logger::log_error(&format!("Failed to build {status} response: {error}"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};

    async fn body_bytes(response: HttpResponse) -> io::Result<Bytes> {
        Ok(response.into_body().collect().await?.to_bytes())
    }

    #[tokio::test]
    async fn test_resource_response_streams_body() {
        let stream: ByteStream = Box::pin(Cursor::new(b"hello".to_vec()));
        let response = build_resource_response(stream, Some(5), "hello.txt".to_string());
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["Content-Length"], "5");
        assert_eq!(body_bytes(response).await.unwrap(), "hello");
    }

    #[tokio::test]
    async fn test_unknown_size_omits_length() {
        let stream: ByteStream = Box::pin(Cursor::new(b"abc".to_vec()));
        let response = build_resource_response(stream, None, "abc".to_string());
        assert!(response.headers().get("Content-Length").is_none());
        assert_eq!(body_bytes(response).await.unwrap(), "abc");
    }

    struct FailingReader;

    impl AsyncRead for FailingReader {
        fn poll_read(
            self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            _buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            Poll::Ready(Err(io::Error::from(io::ErrorKind::BrokenPipe)))
        }
    }

    #[tokio::test]
    async fn test_read_failure_aborts_body() {
        let response = build_resource_response(Box::pin(FailingReader), None, "gone".to_string());
        let err = body_bytes(response).await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }

    #[tokio::test]
    async fn test_head_keeps_length_drops_body() {
        let response = build_head_response(Some(5));
        assert_eq!(response.headers()["Content-Length"], "5");
        assert!(body_bytes(response).await.unwrap().is_empty());
    }

    #[test]
    fn test_405_lists_allowed_methods() {
        let response = build_405_response();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers()["Allow"], "GET, HEAD, OPTIONS");
    }
}
