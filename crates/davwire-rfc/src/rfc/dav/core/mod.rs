//! `WebDAV` XML name types.

mod namespace;
mod property;

pub use namespace::{Namespace, QName};
pub use property::PropertyName;
