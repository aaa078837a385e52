//! HTTP byte-range handling for content delivery.
//!
//! Single ranges only; `multipart/byteranges` is not produced.

pub mod core;
pub mod delivery;
mod error;
pub mod parse;
pub mod stream;

pub use self::core::{ByteRange, ResolvedInterval, unsatisfied_content_range};
pub use delivery::{
    ContentDelivery, ContentTarget, DeliveryOutcome, FolderRenderer, ResourceKind, ResourceStore,
    ResponseHead, StoredObject, file_head, range_header,
};
pub use error::{RangeError, RangeResult, TransferError, TransferResult};
pub use parse::parse_range;
pub use stream::ContentStreamer;
