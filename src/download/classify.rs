//! Failure classification for yt-dlp output
//!
//! Decides whether a failed attempt is worth another strategy (blocked,
//! format mismatch), worth another try of the same strategy (transient
//! network trouble), or pointless to retry at all (the video itself is
//! gone). All marker knowledge is concentrated here.

/// How a non-success attempt is classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// Source actively rejected the request as automated/rate-limited traffic
    Blocked,
    /// The requested format expression matched nothing for this source
    FormatUnavailable,
    /// Transient network trouble; the robust variant retries the same strategy
    Network,
    /// Video private/removed/unavailable; switching strategy cannot fix it
    Fatal,
}

/// Classifies combined stdout+stderr of a failed yt-dlp run.
pub fn classify_failure(output: &str) -> FailureKind {
    let lower = output.to_lowercase();

    // The video itself is gone — checked first so "private video" is never
    // mistaken for a challenge we could route around
    if lower.contains("private video")
        || lower.contains("video unavailable")
        || lower.contains("this video is not available")
        || lower.contains("video is private")
        || lower.contains("video has been removed")
        || lower.contains("this video does not exist")
        || lower.contains("account associated with this video has been terminated")
    {
        return FailureKind::Fatal;
    }

    if lower.contains("http error 403")
        || lower.contains("forbidden")
        || lower.contains("http error 429")
        || lower.contains("too many requests")
        || lower.contains("sign in to confirm")
        || lower.contains("bot detection")
        || lower.contains("confirm you're not a bot")
        || lower.contains("unable to extract")
        || lower.contains("signature extraction failed")
    {
        return FailureKind::Blocked;
    }

    if lower.contains("requested format is not available") || lower.contains("format is not available") {
        return FailureKind::FormatUnavailable;
    }

    if lower.contains("timed out")
        || lower.contains("timeout")
        || lower.contains("connection reset")
        || lower.contains("connection refused")
        || lower.contains("failed to connect")
        || lower.contains("network is unreachable")
        || lower.contains("temporary failure in name resolution")
        || lower.contains("[errno")
    {
        return FailureKind::Network;
    }

    // Anything else is a hard failure for this source: a different client
    // fingerprint does not change an unknown extractor error
    FailureKind::Fatal
}

/// Last N characters of a diagnostic block, for attempt logs.
pub fn error_excerpt(output: &str, max_chars: usize) -> String {
    let trimmed = output.trim();
    let count = trimmed.chars().count();
    if count <= max_chars {
        return trimmed.to_string();
    }
    trimmed.chars().skip(count - max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_blocked_markers() {
        assert_eq!(classify_failure("ERROR: HTTP Error 403: Forbidden"), FailureKind::Blocked);
        assert_eq!(
            classify_failure("Sign in to confirm you're not a bot. Use --cookies"),
            FailureKind::Blocked
        );
        assert_eq!(
            classify_failure("ERROR: unable to extract player response"),
            FailureKind::Blocked
        );
        assert_eq!(classify_failure("HTTP Error 429: Too Many Requests"), FailureKind::Blocked);
    }

    #[test]
    fn classifies_format_markers() {
        assert_eq!(
            classify_failure("ERROR: Requested format is not available"),
            FailureKind::FormatUnavailable
        );
    }

    #[test]
    fn classifies_fatal_markers() {
        assert_eq!(classify_failure("ERROR: Private video"), FailureKind::Fatal);
        assert_eq!(classify_failure("ERROR: Video unavailable"), FailureKind::Fatal);
        // Unknown errors are not retryable by switching strategy
        assert_eq!(classify_failure("ERROR: something exotic happened"), FailureKind::Fatal);
    }

    #[test]
    fn classifies_network_markers() {
        assert_eq!(classify_failure("Connection reset by peer"), FailureKind::Network);
        assert_eq!(
            classify_failure("ERROR: The read operation timed out"),
            FailureKind::Network
        );
    }

    #[test]
    fn fatal_wins_over_blocked_markers() {
        // A private video often also logs extraction noise; it must stay fatal
        assert_eq!(
            classify_failure("unable to extract metadata\nERROR: Private video"),
            FailureKind::Fatal
        );
    }

    #[test]
    fn excerpt_keeps_the_tail() {
        let long = format!("{}END", "x".repeat(600));
        let excerpt = error_excerpt(&long, 100);
        assert_eq!(excerpt.chars().count(), 100);
        assert!(excerpt.ends_with("END"));
    }
}
