//! Engine test-item identifier grammar.
//!
//! The engine names every runnable item with a bracketed two-token string:
//!
//! ```text
//! identifier := [ "-" | "+" ] "[" class " " method "]"
//! class      := 1*(any char except " ", "[", "]")
//! method     := 1*(any char except " ", "[", "]")
//! ```
//!
//! The optional leading marker tells instance and class methods apart. It carries nothing we
//! display, so it is accepted and dropped. [`encode`] always produces the unmarked form.

use thiserror::Error;

use crate::TestDescriptor;

/// Why an identifier was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MalformedReason {
    #[error("expected an opening `[`")]
    MissingOpenBracket,
    #[error("expected a closing `]`")]
    MissingCloseBracket,
    #[error("unexpected text after the closing `]`")]
    TrailingText,
    #[error("unexpected `[` inside the brackets")]
    NestedBracket,
    #[error("expected exactly two space-separated tokens, found {0}")]
    TokenCount(usize),
    #[error("class and method tokens must not be empty")]
    EmptyToken,
}

/// An engine identifier that does not follow the bracketed two-token grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("malformed test identifier `{identifier}`: {reason}")]
pub struct MalformedIdentifierError {
    pub identifier: String,
    pub reason: MalformedReason,
}

/// Parse an engine identifier such as `-[AlphaTests testOne]` into a descriptor.
pub fn parse(identifier: &str) -> Result<TestDescriptor, MalformedIdentifierError> {
    let malformed = |reason| MalformedIdentifierError {
        identifier: identifier.to_string(),
        reason,
    };

    let body = identifier.strip_prefix(|c| c == '-' || c == '+').unwrap_or(identifier);
    let inner = body
        .strip_prefix('[')
        .ok_or_else(|| malformed(MalformedReason::MissingOpenBracket))?;

    let Some(close) = inner.find(']') else {
        return Err(malformed(MalformedReason::MissingCloseBracket));
    };
    if close + 1 != inner.len() {
        return Err(malformed(MalformedReason::TrailingText));
    }
    let inner = &inner[..close];
    if inner.contains('[') {
        return Err(malformed(MalformedReason::NestedBracket));
    }

    let tokens: Vec<&str> = inner.split(' ').collect();
    let [class_name, method_name] = tokens.as_slice() else {
        return Err(malformed(MalformedReason::TokenCount(tokens.len())));
    };
    if class_name.is_empty() || method_name.is_empty() {
        return Err(malformed(MalformedReason::EmptyToken));
    }

    Ok(TestDescriptor::new(*class_name, *method_name))
}

/// Encode a descriptor in the canonical `[Class method]` form.
pub fn encode(descriptor: &TestDescriptor) -> String {
    format!("[{} {}]", descriptor.class_name, descriptor.method_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reason_of(identifier: &str) -> MalformedReason {
        parse(identifier).unwrap_err().reason
    }

    #[test]
    fn test_parse_plain_identifier() {
        let descriptor = parse("[AlphaTests testOne]").unwrap();
        assert_eq!(descriptor.class_name, "AlphaTests");
        assert_eq!(descriptor.method_name, "testOne");
    }

    #[test]
    fn test_parse_drops_method_marker() {
        assert_eq!(parse("-[BetaTests testTwo]").unwrap(), TestDescriptor::new("BetaTests", "testTwo"));
        assert_eq!(parse("+[BetaTests setUp]").unwrap(), TestDescriptor::new("BetaTests", "setUp"));
    }

    #[test]
    fn test_parse_keeps_qualified_class_token() {
        let descriptor = parse("-[App.SwiftTests testExample]").unwrap();
        assert_eq!(descriptor.class_name, "App.SwiftTests");
    }

    #[test]
    fn test_encode_matches_parse() {
        let descriptor = TestDescriptor::new("BetaTests", "testThree");
        assert_eq!(encode(&descriptor), "[BetaTests testThree]");
        assert_eq!(parse(&encode(&descriptor)).unwrap(), descriptor);
    }

    #[test]
    fn test_rejects_garbage() {
        let err = parse("garbage").unwrap_err();
        assert_eq!(err.identifier, "garbage");
        assert_eq!(err.reason, MalformedReason::MissingOpenBracket);
    }

    #[test]
    fn test_rejects_bad_shapes() {
        assert_eq!(reason_of("[AlphaTests testOne"), MalformedReason::MissingCloseBracket);
        assert_eq!(reason_of("[AlphaTests testOne]x"), MalformedReason::TrailingText);
        assert_eq!(reason_of("[Alpha[Tests testOne]"), MalformedReason::NestedBracket);
        assert_eq!(reason_of("[OnlyOne]"), MalformedReason::TokenCount(1));
        assert_eq!(reason_of("[A b c]"), MalformedReason::TokenCount(3));
        assert_eq!(reason_of("[A  b]"), MalformedReason::TokenCount(3));
        assert_eq!(reason_of("[ b]"), MalformedReason::EmptyToken);
        assert_eq!(reason_of("--[A b]"), MalformedReason::MissingOpenBracket);
    }

    #[test]
    fn test_error_message_names_identifier() {
        let message = parse("[OnlyOne]").unwrap_err().to_string();
        assert_eq!(
            message,
            "malformed test identifier `[OnlyOne]`: expected exactly two space-separated tokens, found 1"
        );
    }
}
