use crate::error::{OrmError, OrmResult};
use std::collections::HashMap;

/// Parse an `orm` field tag: a comma-separated list of `key=value` pairs.
///
/// Whitespace around keys and values is trimmed. A pair without exactly one
/// `=`, or with an empty key or value, fails with `InvalidTag` carrying the
/// offending pair.
pub fn parse_tag(tag: &str) -> OrmResult<HashMap<String, String>> {
    let mut pairs = HashMap::new();
    for pair in tag.split(',') {
        let mut parts = pair.split('=');
        let (Some(key), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(OrmError::InvalidTag(pair.to_string()));
        };
        let (key, value) = (key.trim(), value.trim());
        if key.is_empty() || value.is_empty() {
            return Err(OrmError::InvalidTag(pair.to_string()));
        }
        pairs.insert(key.to_string(), value.to_string());
    }
    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pairs() {
        let pairs = parse_tag("column = user_name, size=10").unwrap();
        assert_eq!(pairs["column"], "user_name");
        assert_eq!(pairs["size"], "10");
    }

    #[test]
    fn rejects_malformed_pairs() {
        for tag in ["column", "column=a=b", "=x", "column= ", "column=x,"] {
            assert!(
                matches!(parse_tag(tag), Err(OrmError::InvalidTag(_))),
                "{tag:?} should be rejected"
            );
        }
    }
}
