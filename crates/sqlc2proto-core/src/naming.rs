//! Naming convention utilities for code generation.
//!
//! # Supported Conversions
//!
//! | Input | Function | Output |
//! |-------|----------|--------|
//! | `CustomerID` | [`to_snake_case`] | `customer_id` |
//! | `user_id` | [`go_camel_case`] | `UserId` |
//! | `ListBooks` | [`to_snake_case`] | `list_books` |

use heck::ToSnakeCase;

/// Acronyms rewritten to a single capitalised word before splitting, longest first.
const WHOLE_WORD_ACRONYMS: &[(&str, &str)] = &[("UUID", "Uuid"), ("ULID", "Ulid"), ("ID", "Id")];

/// Convert a Go identifier to snake_case.
///
/// `ID`, `UUID` and `ULID` are treated as single words, so an acronym in
/// front of them stays together.
///
/// # Examples
///
/// ```
/// use sqlc2proto_core::naming::to_snake_case;
///
/// assert_eq!(to_snake_case("UserID"), "user_id");
/// assert_eq!(to_snake_case("APIKey"), "api_key");
/// assert_eq!(to_snake_case("UUID"), "uuid");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let mut normalized = s.to_string();
    for (acronym, word) in WHOLE_WORD_ACRONYMS {
        normalized = normalized.replace(acronym, word);
    }
    normalized.to_snake_case()
}

/// Go struct field name that protoc-gen-go generates for a proto field.
///
/// Mirrors protoc-gen-go's `GoCamelCase`: an underscore followed by a
/// lowercase letter is dropped and the letter capitalised, everything
/// else is kept.
///
/// # Examples
///
/// ```
/// use sqlc2proto_core::naming::go_camel_case;
///
/// assert_eq!(go_camel_case("user_id"), "UserId");
/// assert_eq!(go_camel_case("UserID"), "UserID");
/// assert_eq!(go_camel_case("page_token_2"), "PageToken_2");
/// ```
pub fn go_camel_case(s: &str) -> String {
    let bytes = s.as_bytes();
    let mut out = String::with_capacity(s.len());
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        let next_is_lower = bytes.get(i + 1).is_some_and(u8::is_ascii_lowercase);

        if c == b'.' && next_is_lower {
            // dropped
        } else if c == b'.' {
            out.push('_');
        } else if c == b'_' && (i == 0 || bytes[i - 1] == b'.') {
            out.push('X');
        } else if c == b'_' && next_is_lower {
            // dropped, next letter is capitalised below
        } else if c.is_ascii_digit() {
            out.push(c as char);
        } else {
            out.push(c.to_ascii_uppercase() as char);
            while bytes.get(i + 1).is_some_and(u8::is_ascii_lowercase) {
                i += 1;
                out.push(bytes[i] as char);
            }
        }
        i += 1;
    }

    out
}

/// Capitalize the first letter of a string.
pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Whether a Go identifier is exported (starts with an uppercase letter).
pub fn is_exported(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}
