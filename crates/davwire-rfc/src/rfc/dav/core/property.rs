//! DAV property names.

use std::fmt;

use super::namespace::QName;

/// A requested property: its local name (prefix stripped) and namespace.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyName(QName);

impl PropertyName {
    #[must_use]
    pub fn new(qname: QName) -> Self {
        Self(qname)
    }

    #[must_use]
    pub fn qname(&self) -> &QName {
        &self.0
    }

    #[must_use]
    pub fn local_name(&self) -> &str {
        self.0.local_name()
    }

    #[must_use]
    pub fn namespace_uri(&self) -> Option<&str> {
        self.0.namespace_uri()
    }
}

impl AsRef<str> for PropertyName {
    fn as_ref(&self) -> &str {
        self.local_name()
    }
}

impl PartialEq<str> for PropertyName {
    fn eq(&self, other: &str) -> bool {
        self.local_name() == other
    }
}

impl PartialEq<&str> for PropertyName {
    fn eq(&self, other: &&str) -> bool {
        self.local_name() == *other
    }
}

impl fmt::Display for PropertyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.local_name())
    }
}
