//! Per-request static resource consumption
//!
//! Resolves a request path against the registry and, on a hit, copies the
//! resource bytes into the response body.

use std::sync::Arc;

use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::error::{Result, StaticFilesError};
use crate::registry::StaticResourceRegistry;
use crate::resource::ByteStream;

/// A resolved resource with its stream already open
pub struct OpenedResource {
    /// Provider location the stream was opened from
    pub location: String,
    pub size: Option<u64>,
    pub stream: ByteStream,
}

#[derive(Debug, Clone)]
pub struct RequestStaticResourceConsumer {
    registry: Arc<StaticResourceRegistry>,
}

impl RequestStaticResourceConsumer {
    pub const fn new(registry: Arc<StaticResourceRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &StaticResourceRegistry {
        &self.registry
    }

    /// Resolve `request_path` and open the matching resource.
    ///
    /// `Ok(None)` if nothing matched. An open failure is a `Streaming` error.
    pub async fn open(&self, request_path: &str) -> Result<Option<OpenedResource>> {
        let Some(resource) = self.registry.resolve(request_path)? else {
            return Ok(None);
        };
        let stream = resource.open_stream().await?;
        Ok(Some(OpenedResource {
            location: resource.location().to_string(),
            size: resource.size(),
            stream,
        }))
    }

    /// Write the resource matching `request_path` into `body`.
    ///
    /// Returns `Ok(true)` once the whole resource has been written and
    /// `Ok(false)` if nothing matched, in which case `body` is untouched.
    /// Failures after a resource was resolved are `Streaming` errors.
    pub async fn consume<W>(&self, request_path: &str, body: &mut W) -> Result<bool>
    where
        W: AsyncWrite + Unpin + ?Sized,
    {
        let Some(OpenedResource {
            location,
            mut stream,
            ..
        }) = self.open(request_path).await?
        else {
            return Ok(false);
        };

        let streaming_error = |source| StaticFilesError::Streaming {
            path: location.clone(),
            source,
        };
        tokio::io::copy(&mut stream, body)
            .await
            .map_err(streaming_error)?;
        body.flush().await.map_err(streaming_error)?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::tests::MemoryProvider;
    use crate::resource::{PackagedProvider, ResourceProvider};
    use async_trait::async_trait;
    use std::io;
    use std::pin::Pin;
    use std::task::{Context, Poll};
    use tokio::io::{AsyncRead, ReadBuf};

    fn consumer(registry: StaticResourceRegistry) -> RequestStaticResourceConsumer {
        RequestStaticResourceConsumer::new(Arc::new(registry))
    }

    #[tokio::test]
    async fn test_packaged_index_is_consumed() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();

        let mut body = Vec::new();
        assert!(consumer(registry).consume("/", &mut body).await.unwrap());

        let expected = include_bytes!("../assets/public/index.html");
        assert_eq!(body, expected);
    }

    #[tokio::test]
    async fn test_no_roots_is_not_consumed() {
        let mut body = Vec::new();
        let consumed = consumer(StaticResourceRegistry::new())
            .consume("/anything.js", &mut body)
            .await
            .unwrap();
        assert!(!consumed);
        assert!(body.is_empty());
    }

    #[tokio::test]
    async fn test_miss_leaves_body_untouched() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();

        let mut body = Vec::new();
        let consumed = consumer(registry)
            .consume("/missing.png", &mut body)
            .await
            .unwrap();
        assert!(!consumed);
        assert!(body.is_empty());
    }

    /// Yields some bytes, then fails
    struct BrokenReader {
        sent: bool,
    }

    impl AsyncRead for BrokenReader {
        fn poll_read(
            mut self: Pin<&mut Self>,
            _cx: &mut Context<'_>,
            buf: &mut ReadBuf<'_>,
        ) -> Poll<io::Result<()>> {
            if self.sent {
                return Poll::Ready(Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    "disk went away",
                )));
            }
            self.sent = true;
            buf.put_slice(b"partial");
            Poll::Ready(Ok(()))
        }
    }

    #[derive(Debug)]
    struct BrokenProvider(MemoryProvider);

    #[async_trait]
    impl ResourceProvider for BrokenProvider {
        fn locate(&self, base_path: &str, relative_path: &str) -> io::Result<Option<String>> {
            self.0.locate(base_path, relative_path)
        }

        fn is_directory(&self, path: &str) -> bool {
            self.0.is_directory(path)
        }

        async fn open_stream(&self, _path: &str) -> io::Result<ByteStream> {
            Ok(Box::pin(BrokenReader { sent: false }))
        }
    }

    #[tokio::test]
    async fn test_failure_mid_copy_is_streaming_error() {
        let provider = BrokenProvider(MemoryProvider::with_files(&[(
            "www/big.bin",
            "never fully read",
        )]));
        let mut registry = StaticResourceRegistry::with_providers(
            Arc::new(PackagedProvider::new()),
            Arc::new(provider),
        );
        registry.configure_external_root("www").unwrap();

        let mut body = Vec::new();
        let err = consumer(registry)
            .consume("/big.bin", &mut body)
            .await
            .unwrap_err();
        assert!(err.is_streaming_failure());
        assert!(matches!(err, StaticFilesError::Streaming { ref path, .. } if path == "www/big.bin"));
    }

    #[tokio::test]
    async fn test_open_failure_is_streaming_error() {
        #[derive(Debug)]
        struct Unopenable(MemoryProvider);

        #[async_trait]
        impl ResourceProvider for Unopenable {
            fn locate(&self, base_path: &str, relative_path: &str) -> io::Result<Option<String>> {
                self.0.locate(base_path, relative_path)
            }

            fn is_directory(&self, path: &str) -> bool {
                self.0.is_directory(path)
            }

            async fn open_stream(&self, _path: &str) -> io::Result<ByteStream> {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            }
        }

        let provider = Unopenable(MemoryProvider::with_files(&[("www/a.txt", "a")]));
        let mut registry = StaticResourceRegistry::with_providers(
            Arc::new(PackagedProvider::new()),
            Arc::new(provider),
        );
        registry.configure_external_root("www").unwrap();

        let mut body = Vec::new();
        let err = consumer(registry)
            .consume("/a.txt", &mut body)
            .await
            .unwrap_err();
        assert!(err.is_streaming_failure());
    }

    #[tokio::test]
    async fn test_memory_root_streams_bytes() {
        let provider = MemoryProvider::with_files(&[("www/docs/index.html", "<p>docs</p>")]);
        let mut registry = StaticResourceRegistry::with_providers(
            Arc::new(PackagedProvider::new()),
            Arc::new(provider),
        );
        registry.configure_external_root("www").unwrap();

        let mut body = Vec::new();
        assert!(consumer(registry).consume("/docs/", &mut body).await.unwrap());
        assert_eq!(body, b"<p>docs</p>");
    }

    #[tokio::test]
    async fn test_open_reports_size() {
        let mut registry = StaticResourceRegistry::new();
        registry.configure_packaged_root("public").unwrap();

        let opened = consumer(registry).open("/css/site.css").await.unwrap().unwrap();
        let expected = include_bytes!("../assets/public/css/site.css").len() as u64;
        assert_eq!(opened.size, Some(expected));
        assert_eq!(opened.location, "public/css/site.css");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_fifo_does_not_stall_the_runtime() {
        let dir = tempfile::tempdir().unwrap();
        let status = std::process::Command::new("mkfifo")
            .arg(dir.path().join("pipe.txt"))
            .status()
            .unwrap();
        assert!(status.success());

        let mut registry = StaticResourceRegistry::new();
        registry
            .configure_external_root(&dir.path().to_string_lossy())
            .unwrap();

        let consumer = consumer(registry);
        let mut body = Vec::new();
        let consumed = tokio::time::timeout(
            std::time::Duration::from_secs(2),
            consumer.consume("/pipe.txt", &mut body),
        )
        .await
        .expect("consume must finish without waiting on the pipe")
        .unwrap();
        assert!(!consumed);
        assert!(body.is_empty());
    }
}
