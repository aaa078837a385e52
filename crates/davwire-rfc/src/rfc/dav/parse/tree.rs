//! Owned XML tree produced by the secure parser.

use crate::rfc::dav::core::{Namespace, QName};

/// A parsed document: the root element plus any comments or processing
/// instructions around it. The XML declaration is not kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlDocument {
    pub prolog: Vec<XmlNode>,
    pub root: XmlElement,
    pub epilog: Vec<XmlNode>,
}

impl XmlDocument {
    #[must_use]
    pub fn new(root: XmlElement) -> Self {
        Self {
            prolog: Vec::new(),
            root,
            epilog: Vec::new(),
        }
    }

    #[must_use]
    pub const fn root(&self) -> &XmlElement {
        &self.root
    }
}

/// A child of an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum XmlNode {
    Element(XmlElement),
    /// Character data with references already resolved.
    Text(String),
    CData(String),
    Comment(String),
    ProcessingInstruction(String),
}

impl XmlNode {
    #[must_use]
    pub const fn as_element(&self) -> Option<&XmlElement> {
        match self {
            Self::Element(element) => Some(element),
            _ => None,
        }
    }
}

/// An element with its resolved namespace.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct XmlElement {
    /// Prefix as written in the source, kept for faithful re-serialisation.
    pub prefix: Option<String>,
    pub local_name: String,
    /// URI the prefix (or the default namespace) resolved to.
    pub namespace: Option<String>,
    /// Attributes in document order, names as written (`xmlns:*` included).
    pub attributes: Vec<(String, String)>,
    pub children: Vec<XmlNode>,
}

impl XmlElement {
    /// Creates an element with no prefix, namespace, attributes or children.
    #[must_use]
    pub fn new(local_name: impl Into<String>) -> Self {
        Self {
            prefix: None,
            local_name: local_name.into(),
            namespace: None,
            attributes: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Name as written in the source, `prefix:local` or `local`.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{prefix}:{}", self.local_name),
            None => self.local_name.clone(),
        }
    }

    /// Namespace-qualified name, independent of the prefix used.
    #[must_use]
    pub fn qname(&self) -> QName {
        QName::new(
            self.namespace.clone().map(Namespace::from),
            self.local_name.clone(),
        )
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Direct element children in document order.
    pub fn child_elements(&self) -> impl Iterator<Item = &XmlElement> {
        self.children.iter().filter_map(XmlNode::as_element)
    }

    /// First direct element child with the given local name, whatever its
    /// prefix or namespace.
    #[must_use]
    pub fn find_child(&self, local_name: &str) -> Option<&XmlElement> {
        self.child_elements()
            .find(|child| child.local_name == local_name)
    }

    /// First direct element child matching a namespace and local name.
    #[must_use]
    pub fn find_child_ns(&self, namespace: &str, local_name: &str) -> Option<&XmlElement> {
        self.child_elements().find(|child| {
            child.local_name == local_name && child.namespace.as_deref() == Some(namespace)
        })
    }

    /// Concatenated text and CDATA of direct children.
    #[must_use]
    pub fn text(&self) -> String {
        self.children
            .iter()
            .filter_map(|node| match node {
                XmlNode::Text(text) | XmlNode::CData(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }
}
