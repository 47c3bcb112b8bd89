//! Connection-refused classification.
//!
//! Transports report unreachable endpoints with a message beginning with
//! `no connection could be made` (any case), naming the endpoint in the
//! first parenthesized group when it is known. [`refused_endpoint`]
//! recognizes that shape; every other failure message is left to propagate
//! unchanged.

const REFUSED_PREFIX: &str = "no connection could be made";

/// Endpoint placeholder when a refused-connection message names no endpoint.
pub(crate) const UNKNOWN_ENDPOINT: &str = "-";

/// Extracts the refused endpoint from a transport failure message.
///
/// Returns `Some` only when the message starts with the refused-connection
/// prefix (case-insensitive). The endpoint is the content of the first
/// parenthesized group, or [`UNKNOWN_ENDPOINT`] when the message has none.
pub(crate) fn refused_endpoint(message: &str) -> Option<String> {
    let head = message.get(..REFUSED_PREFIX.len())?;
    if !head.eq_ignore_ascii_case(REFUSED_PREFIX) {
        return None;
    }
    Some(
        parenthesized(message)
            .unwrap_or(UNKNOWN_ENDPOINT)
            .to_owned(),
    )
}

fn parenthesized(message: &str) -> Option<&str> {
    let open = message.find('(')?;
    let rest = &message[open + 1..];
    let close = rest.find(')')?;
    Some(&rest[..close])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recognizes_refused_message_with_endpoint() {
        let message =
            "No connection could be made because the target machine actively refused it (localhost:7049)";
        assert_eq!(refused_endpoint(message).as_deref(), Some("localhost:7049"));
    }

    #[test]
    fn test_prefix_match_is_case_insensitive() {
        assert_eq!(
            refused_endpoint("NO CONNECTION COULD BE MADE (10.0.0.1:80)").as_deref(),
            Some("10.0.0.1:80")
        );
        assert_eq!(
            refused_endpoint("no connection could be made (a)").as_deref(),
            Some("a")
        );
    }

    #[test]
    fn test_missing_parentheses_yields_placeholder() {
        assert_eq!(
            refused_endpoint("No connection could be made, no details").as_deref(),
            Some("-")
        );
    }

    #[test]
    fn test_empty_parentheses_yield_empty_endpoint() {
        assert_eq!(
            refused_endpoint("no connection could be made ()").as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_takes_first_group_only() {
        assert_eq!(
            refused_endpoint("no connection could be made (first) then (second)").as_deref(),
            Some("first")
        );
    }

    #[test]
    fn test_unrelated_messages_are_not_classified() {
        assert_eq!(refused_endpoint("connection reset by peer"), None);
        assert_eq!(refused_endpoint("timed out (10s)"), None);
        assert_eq!(refused_endpoint(""), None);
        // The prefix must start the message, not merely appear in it.
        assert_eq!(
            refused_endpoint("error: no connection could be made (x)"),
            None
        );
    }

    #[test]
    fn test_short_messages_do_not_panic() {
        assert_eq!(refused_endpoint("no conn"), None);
    }
}
