//! GET/HEAD content delivery with range support.
//!
//! The store, the folder body and the response target are collaborators
//! passed in by the caller; this module only decides the status, the length
//! and range headers, and streams the selected bytes.

use std::future::Future;
use std::io;

use salvo::http::header::{
    ACCEPT_RANGES, ALLOW, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE, RANGE,
};
use salvo::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};

use davwire_core::constants::{BYTES_UNIT, NULL_RESOURCE_ALLOW};

use super::core::{ByteRange, ResolvedInterval, unsatisfied_content_range};
use super::error::{RangeError, TransferError};
use super::parse::parse_range;
use super::stream::ContentStreamer;

/// What a path in the store refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    File,
    Folder,
    /// A placeholder created by a lock on a path that has no content yet.
    Null,
}

/// Store metadata needed to serve a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StoredObject {
    pub kind: ResourceKind,
    /// Content length in bytes; meaningful for files only.
    pub length: u64,
}

impl StoredObject {
    #[must_use]
    pub const fn file(length: u64) -> Self {
        Self {
            kind: ResourceKind::File,
            length,
        }
    }

    #[must_use]
    pub const fn folder() -> Self {
        Self {
            kind: ResourceKind::Folder,
            length: 0,
        }
    }

    #[must_use]
    pub const fn null() -> Self {
        Self {
            kind: ResourceKind::Null,
            length: 0,
        }
    }
}

/// The backing resource store.
pub trait ResourceStore: Send + Sync {
    /// Content reader, positioned at byte 0 when returned by [`Self::open`].
    type Reader: AsyncRead + Unpin + Send;

    /// Looks up a path; `Ok(None)` when nothing exists there.
    fn stat(&self, path: &str) -> impl Future<Output = io::Result<Option<StoredObject>>> + Send;

    /// Opens the content of a file resource.
    fn open(&self, path: &str) -> impl Future<Output = io::Result<Self::Reader>> + Send;
}

/// Produces the body served for a folder on GET.
pub trait FolderRenderer: Send + Sync {
    fn render(&self, path: &str) -> String;
}

/// Status and headers of a response, committed before any body byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseHead {
    pub status: StatusCode,
    pub headers: HeaderMap,
}

impl ResponseHead {
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
        }
    }

    /// Sets a header, dropping values that are not valid header text.
    pub fn set(&mut self, name: HeaderName, value: impl AsRef<str>) {
        match HeaderValue::from_str(value.as_ref()) {
            Ok(value) => {
                self.headers.insert(name, value);
            }
            Err(err) => {
                tracing::warn!(header = %name, error = %err, "Dropping invalid header value");
            }
        }
    }

    #[must_use]
    pub fn header(&self, name: &HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|value| value.to_str().ok())
    }
}

/// Where a response goes: a body sink that is told the head first.
pub trait ContentTarget: AsyncWrite + Unpin + Send {
    /// Commits status and headers. Called exactly once per delivery.
    fn commit(&mut self, head: ResponseHead);
}

/// How a delivery ended.
#[derive(Debug)]
pub enum DeliveryOutcome {
    /// Headers committed and the body (if any) fully sent.
    Complete { status: StatusCode, written: u64 },
    /// Answered with an error status before any body byte.
    Rejected { status: StatusCode },
    /// Headers were committed but the body transfer failed part way.
    Aborted {
        status: StatusCode,
        error: TransferError,
    },
}

impl DeliveryOutcome {
    /// Status committed to the client.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Complete { status, .. }
            | Self::Rejected { status }
            | Self::Aborted { status, .. } => *status,
        }
    }
}

/// Extracts the `Range` header from request headers.
///
/// ## Errors
/// `RangeError::Syntax` if the header holds non-visible-ASCII bytes.
pub fn range_header(headers: &HeaderMap) -> Result<Option<&str>, RangeError> {
    headers
        .get(RANGE)
        .map(|value| {
            value
                .to_str()
                .map_err(|_err| RangeError::syntax("range header is not visible ASCII"))
        })
        .transpose()
}

/// Serves file and folder bodies out of a [`ResourceStore`].
#[derive(Debug, Clone)]
pub struct ContentDelivery<S, F> {
    store: S,
    folders: F,
    streamer: ContentStreamer,
}

impl<S, F> ContentDelivery<S, F>
where
    S: ResourceStore,
    F: FolderRenderer,
{
    #[must_use]
    pub const fn new(store: S, folders: F, streamer: ContentStreamer) -> Self {
        Self {
            store,
            folders,
            streamer,
        }
    }

    #[must_use]
    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Answers a GET or HEAD for `path`.
    ///
    /// ## Summary
    /// Range errors are answered with 400/416 before the body starts;
    /// failures after the head is committed are logged and reported as
    /// [`DeliveryOutcome::Aborted`]. HEAD commits the same head as GET and
    /// writes no body.
    #[tracing::instrument(skip(self, request_headers, target))]
    pub async fn deliver<T>(
        &self,
        method: &Method,
        path: &str,
        request_headers: &HeaderMap,
        target: &mut T,
    ) -> DeliveryOutcome
    where
        T: ContentTarget,
    {
        let range = match range_header(request_headers)
            .and_then(|header| header.map(parse_range).transpose())
        {
            Ok(range) => range,
            Err(err) => return reject_range(target, &err),
        };

        let object = match self.store.stat(path).await {
            Ok(Some(object)) => object,
            Ok(None) => return reject(target, ResponseHead::new(StatusCode::NOT_FOUND)),
            Err(err) => {
                tracing::error!(error = %err, "Failed to stat resource");
                return reject(target, ResponseHead::new(StatusCode::INTERNAL_SERVER_ERROR));
            }
        };

        let with_body = *method != Method::HEAD;
        match object.kind {
            ResourceKind::Null => {
                let mut head = ResponseHead::new(StatusCode::METHOD_NOT_ALLOWED);
                head.set(ALLOW, NULL_RESOURCE_ALLOW);
                reject(target, head)
            }
            ResourceKind::Folder => self.deliver_folder(path, target, with_body).await,
            ResourceKind::File => {
                self.deliver_file(path, range, object.length, target, with_body)
                    .await
            }
        }
    }

    async fn deliver_folder<T>(&self, path: &str, target: &mut T, with_body: bool) -> DeliveryOutcome
    where
        T: ContentTarget,
    {
        let body = self.folders.render(path);

        let mut head = ResponseHead::new(StatusCode::OK);
        head.set(CONTENT_TYPE, "text/html; charset=utf-8");
        head.set(CONTENT_LENGTH, body.len().to_string());
        target.commit(head);

        if !with_body {
            return DeliveryOutcome::Complete {
                status: StatusCode::OK,
                written: 0,
            };
        }

        match write_body(target, body.as_bytes()).await {
            Ok(()) => DeliveryOutcome::Complete {
                status: StatusCode::OK,
                written: body.len() as u64,
            },
            Err(err) => abort(StatusCode::OK, TransferError::Io(err)),
        }
    }

    async fn deliver_file<T>(
        &self,
        path: &str,
        range: Option<ByteRange>,
        total_length: u64,
        target: &mut T,
        with_body: bool,
    ) -> DeliveryOutcome
    where
        T: ContentTarget,
    {
        let interval = match range {
            None => ResolvedInterval::full(total_length),
            Some(range) => match range.resolve(total_length) {
                Ok(interval) => interval,
                Err(err) => return reject_range(target, &err),
            },
        };

        let head = file_head(&interval);
        let status = head.status;
        target.commit(head);

        if !with_body {
            return DeliveryOutcome::Complete { status, written: 0 };
        }

        let mut reader = match self.store.open(path).await {
            Ok(reader) => reader,
            Err(err) => return abort(status, TransferError::Io(err)),
        };

        match self.streamer.stream(&mut reader, target, &interval).await {
            Ok(written) => DeliveryOutcome::Complete { status, written },
            Err(err) => abort(status, err),
        }
    }
}

/// Head for a file body: 200 with the full length, or 206 with the range.
#[must_use]
pub fn file_head(interval: &ResolvedInterval) -> ResponseHead {
    let mut head = if interval.partial {
        let mut head = ResponseHead::new(StatusCode::PARTIAL_CONTENT);
        head.set(CONTENT_RANGE, interval.content_range());
        head
    } else {
        ResponseHead::new(StatusCode::OK)
    };
    head.set(CONTENT_LENGTH, interval.len().to_string());
    head.set(ACCEPT_RANGES, BYTES_UNIT);
    head
}

async fn write_body<W>(sink: &mut W, body: &[u8]) -> io::Result<()>
where
    W: AsyncWrite + Unpin + ?Sized,
{
    sink.write_all(body).await?;
    sink.flush().await
}

fn reject_range<T: ContentTarget>(target: &mut T, err: &RangeError) -> DeliveryOutcome {
    tracing::debug!(error = %err, "Rejecting range request");
    let mut head = ResponseHead::new(err.status_code());
    if let RangeError::NotSatisfiable {
        total_length: Some(total),
        ..
    } = err
    {
        head.set(CONTENT_RANGE, unsatisfied_content_range(*total));
    }
    reject(target, head)
}

fn reject<T: ContentTarget>(target: &mut T, head: ResponseHead) -> DeliveryOutcome {
    let status = head.status;
    target.commit(head);
    DeliveryOutcome::Rejected { status }
}

fn abort(status: StatusCode, error: TransferError) -> DeliveryOutcome {
    tracing::error!(error = %error, %status, "Content transfer aborted");
    DeliveryOutcome::Aborted { status, error }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_head_has_length_and_accept_ranges() {
        let head = file_head(&ResolvedInterval::full(42));
        assert_eq!(head.status, StatusCode::OK);
        assert_eq!(head.header(&CONTENT_LENGTH), Some("42"));
        assert_eq!(head.header(&ACCEPT_RANGES), Some("bytes"));
        assert_eq!(head.header(&CONTENT_RANGE), None);
    }

    #[test]
    fn partial_head_has_content_range() {
        let interval = parse_range("bytes=2-5").unwrap().resolve(100).unwrap();
        let head = file_head(&interval);
        assert_eq!(head.status, StatusCode::PARTIAL_CONTENT);
        assert_eq!(head.header(&CONTENT_LENGTH), Some("4"));
        assert_eq!(head.header(&CONTENT_RANGE), Some("bytes 2-5/100"));
    }

    #[test]
    fn range_header_lookup() {
        let mut headers = HeaderMap::new();
        assert_eq!(range_header(&headers), Ok(None));

        headers.insert(RANGE, HeaderValue::from_static("bytes=0-9"));
        assert_eq!(range_header(&headers), Ok(Some("bytes=0-9")));

        headers.insert(RANGE, HeaderValue::from_bytes(b"bytes=\xff-").unwrap());
        assert!(matches!(range_header(&headers), Err(RangeError::Syntax(_))));
    }

    #[test]
    fn invalid_header_values_are_dropped() {
        let mut head = ResponseHead::new(StatusCode::OK);
        head.set(CONTENT_TYPE, "text/plain\n");
        assert!(head.headers.is_empty());
    }
}
