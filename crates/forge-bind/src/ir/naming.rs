//! Native naming of interface members

use crate::error::GenerationError;

/// Convert an IDL identifier to snake_case
///
/// `getElementById` becomes `get_element_by_id` and `HTMLCollection`
/// becomes `html_collection`.
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '-' {
            result.push('_');
            continue;
        }
        if c.is_ascii_uppercase() {
            let prev = if i > 0 { chars.get(i - 1).copied() } else { None };
            let next = chars.get(i + 1).copied();
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.map(|n| n.is_ascii_lowercase()).unwrap_or(false),
                _ => false,
            };
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
            result.push(c.to_ascii_lowercase());
        } else {
            result.push(c);
        }
    }

    result
}

/// Check that a member name can be carried into generated code
///
/// The name must be non-empty printable ASCII without `"`.
pub fn validate_member_name(interface: &str, name: &str) -> Result<(), GenerationError> {
    let printable = name.bytes().all(|b| (0x20..=0x7e).contains(&b) && b != b'"');
    if name.is_empty() || !printable {
        return Err(GenerationError::MalformedMemberName {
            interface: interface.to_string(),
            name: name.to_string(),
        });
    }
    Ok(())
}

/// Derive the native method name of a member
///
/// Keywords get a trailing `_`; anything else that is not an identifier is
/// rejected.
pub fn native_member_name(interface: &str, name: &str) -> Result<String, GenerationError> {
    validate_member_name(interface, name)?;

    let snake = to_snake_case(name);
    if is_identifier(&snake) {
        return Ok(snake);
    }

    let escaped = format!("{}_", snake);
    if !snake.is_empty() && is_identifier(&escaped) {
        return Ok(escaped);
    }

    Err(GenerationError::MalformedMemberName {
        interface: interface.to_string(),
        name: name.to_string(),
    })
}

/// Whether `s` parses as a non-keyword Rust identifier
pub fn is_identifier(s: &str) -> bool {
    syn::parse_str::<syn::Ident>(s).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("getElementById"), "get_element_by_id");
        assert_eq!(to_snake_case("HTMLCollection"), "html_collection");
        assert_eq!(to_snake_case("item"), "item");
        assert_eq!(to_snake_case("handleEvent"), "handle_event");
        assert_eq!(to_snake_case("Uint8Array"), "uint8_array");
        assert_eq!(to_snake_case("data-id"), "data_id");
    }

    #[test]
    fn test_keywords_get_suffix() {
        assert_eq!(native_member_name("Foo", "type").unwrap(), "type_");
        assert_eq!(native_member_name("Foo", "self").unwrap(), "self_");
        assert_eq!(native_member_name("Foo", "match").unwrap(), "match_");
    }

    #[test]
    fn test_malformed_names() {
        for bad in ["", "a\"b", "tab\there", "caf\u{e9}", "1st", "two words"] {
            assert!(
                matches!(
                    native_member_name("Foo", bad),
                    Err(GenerationError::MalformedMemberName { .. })
                ),
                "{:?} should be rejected",
                bad
            );
        }
    }
}
