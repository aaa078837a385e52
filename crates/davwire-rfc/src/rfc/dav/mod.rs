//! RFC 4918 `WebDAV` XML handling.

pub mod build;
pub mod core;
pub mod parse;
