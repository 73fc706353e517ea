use std::collections::BTreeMap;
use std::fmt;

use crate::error::StoreError;

/// The storage flavour of a blob. Only block blobs support the streaming
/// write protocol; the other kinds exist so stores can report what is
/// already there.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlobKind {
    Block,
    Page,
    Append,
}

impl fmt::Display for BlobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlobKind::Block => write!(f, "block"),
            BlobKind::Page => write!(f, "page"),
            BlobKind::Append => write!(f, "append"),
        }
    }
}

/// A blob location: container plus name. Either segment may carry
/// `{placeholder}` patterns resolved against trigger metadata before use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobPath {
    pub container: String,
    pub name: String,
}

impl BlobPath {
    pub fn new(container: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            name: name.into(),
        }
    }

    /// Parses `container/name`; the name may itself contain slashes.
    pub fn parse(path: &str) -> Result<Self, StoreError> {
        match path.split_once('/') {
            Some((container, name)) if !container.is_empty() && !name.is_empty() => {
                Ok(Self::new(container, name))
            }
            _ => Err(StoreError::InvalidPath(path.to_string())),
        }
    }

    /// Substitutes every `{placeholder}` from `vars`. An unknown placeholder
    /// or an unterminated brace is an error.
    pub fn resolve(&self, vars: &BTreeMap<String, String>) -> Result<BlobPath, StoreError> {
        Ok(BlobPath {
            container: substitute(&self.container, vars)?,
            name: substitute(&self.name, vars)?,
        })
    }

    #[must_use]
    pub fn has_placeholders(&self) -> bool {
        self.container.contains('{') || self.name.contains('{')
    }
}

impl fmt::Display for BlobPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.container, self.name)
    }
}

fn substitute(pattern: &str, vars: &BTreeMap<String, String>) -> Result<String, StoreError> {
    let mut out = String::with_capacity(pattern.len());
    let mut rest = pattern;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let end = after
            .find('}')
            .ok_or_else(|| StoreError::InvalidPath(pattern.to_string()))?;
        let placeholder = &after[..end];
        let value = vars
            .get(placeholder)
            .ok_or_else(|| StoreError::UnresolvedPlaceholder {
                pattern: pattern.to_string(),
                placeholder: placeholder.to_string(),
            })?;
        out.push_str(value);
        rest = &after[end + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn parse_splits_on_first_slash() {
        let path = BlobPath::parse("orders/2026/receipt.txt").unwrap();
        assert_eq!(path.container, "orders");
        assert_eq!(path.name, "2026/receipt.txt");
    }

    #[test]
    fn parse_rejects_missing_segments() {
        assert!(BlobPath::parse("orders").is_err());
        assert!(BlobPath::parse("/name").is_err());
        assert!(BlobPath::parse("container/").is_err());
    }

    #[test]
    fn resolve_substitutes_placeholders() {
        let path = BlobPath::parse("reports/{message_id}.txt").unwrap();
        let resolved = path.resolve(&vars(&[("message_id", "msg-7")])).unwrap();
        assert_eq!(resolved.to_string(), "reports/msg-7.txt");
    }

    #[test]
    fn resolve_without_placeholders_is_identity() {
        let path = BlobPath::parse("reports/summary.txt").unwrap();
        let resolved = path.resolve(&BTreeMap::new()).unwrap();
        assert_eq!(resolved, path);
    }

    #[test]
    fn resolve_fails_on_unknown_placeholder() {
        let path = BlobPath::parse("reports/{unknown}").unwrap();
        let err = path.resolve(&BTreeMap::new()).unwrap_err();
        assert!(matches!(err, StoreError::UnresolvedPlaceholder { .. }));
    }

    #[test]
    fn resolve_fails_on_unterminated_brace() {
        let path = BlobPath::new("reports", "{message_id");
        assert!(matches!(
            path.resolve(&vars(&[("message_id", "x")])),
            Err(StoreError::InvalidPath(_))
        ));
    }

    #[test]
    fn has_placeholders_detects_patterns() {
        assert!(BlobPath::parse("reports/{message_id}").unwrap().has_placeholders());
        assert!(!BlobPath::parse("reports/fixed.txt").unwrap().has_placeholders());
    }
}
