//! Protocol layer of the davwire `WebDAV` server.
//!
//! - [`rfc::range`]: `Range` header resolution and ranged content delivery.
//! - [`rfc::dav`]: hardened request XML parsing and response XML building.

pub mod error;
pub mod rfc;
