//! Cell tags: free-form labels, optionally namespaced as `namespace:payload`.

/// Separator between a tag's namespace and its payload.
pub const SEPARATOR: char = ':';

/// A parsed cell tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    raw: String,
    namespace: Option<String>,
    payload: String,
}

impl Tag {
    /// Split at the first separator. A tag without one has no namespace.
    pub fn parse(raw: &str) -> Self {
        let (namespace, payload) = match raw.split_once(SEPARATOR) {
            Some((ns, payload)) => (Some(ns.to_string()), payload.to_string()),
            None => (None, raw.to_string()),
        };
        Self {
            raw: raw.to_string(),
            namespace,
            payload,
        }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    pub fn payload(&self) -> &str {
        &self.payload
    }

    /// The rest of the tag after `namespace` and its separator, if it lives under it.
    ///
    /// Matching is by prefix, so nested namespaces work: `table` matches
    /// `table:resize` and `a:b` matches `a:b:c`.
    pub fn strip_namespace(&self, namespace: &str) -> Option<&str> {
        let rest = self.raw.strip_prefix(namespace)?;
        if namespace.ends_with(SEPARATOR) {
            Some(rest)
        } else {
            rest.strip_prefix(SEPARATOR)
        }
    }
}

pub fn parse_tags<I, S>(raw: I) -> Vec<Tag>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter().map(|t| Tag::parse(t.as_ref())).collect()
}

/// Tags under `namespace` with the prefix removed, in their original order.
///
/// `None` or an empty namespace returns every raw tag unfiltered.
pub fn tags_in<'a>(tags: &'a [Tag], namespace: Option<&str>) -> Vec<&'a str> {
    match namespace.filter(|ns| !ns.is_empty()) {
        Some(ns) => tags.iter().filter_map(|t| t.strip_namespace(ns)).collect(),
        None => tags.iter().map(Tag::raw).collect(),
    }
}
