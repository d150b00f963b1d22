//! Identifier naming conventions.

use regex::Regex;
use std::sync::OnceLock;

fn non_alnum() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("invalid built-in naming regex"))
}

fn word_boundary() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(.)([A-Z][a-z]+)").expect("invalid built-in naming regex"))
}

fn lower_upper() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"([a-z0-9])([A-Z])").expect("invalid built-in naming regex"))
}

fn repeated_underscore() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"_+").expect("invalid built-in naming regex"))
}

/// Convert a camelCase / PascalCase identifier into snake_case.
///
/// Runs of non-alphanumeric characters become a single `_`; an acronym is
/// kept together (`DriverCardID` -> `driver_card_id`); digits stay attached
/// to the preceding word (`first1Second2` -> `first1_second2`).
pub fn camel_to_snake(name: &str) -> String {
    let s = non_alnum().replace_all(name, "_");
    let s = word_boundary().replace_all(&s, "${1}_${2}");
    let s = lower_upper().replace_all(&s, "${1}_${2}");
    let s = repeated_underscore().replace_all(&s, "_");
    s.trim_matches('_').to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_common_shapes() {
        assert_eq!(camel_to_snake("ID"), "id");
        assert_eq!(camel_to_snake("DriverCardID"), "driver_card_id");
        assert_eq!(camel_to_snake("first_second"), "first_second");
        assert_eq!(camel_to_snake("first1Second2"), "first1_second2");
        assert_eq!(camel_to_snake("NickName"), "nick_name");
        assert_eq!(camel_to_snake("SelectTestModel"), "select_test_model");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(camel_to_snake("user-name"), "user_name");
        assert_eq!(camel_to_snake("__Name"), "name");
        assert_eq!(camel_to_snake("HTTPServer"), "http_server");
    }
}
