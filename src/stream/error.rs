use thiserror::Error;

/// Why one strategy/server attempt failed. Every variant is recovered
/// locally by advancing to the next attempt; none of these reach a caller
/// on its own.
#[derive(Debug, Error)]
pub enum NegotiateError {
    #[error("upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    /// Expected markup, attribute or pattern was absent: upstream layout
    /// drifted out from under the extraction rules.
    #[error("upstream layout mismatch: {0}")]
    Protocol(String),
    #[error("source list was empty")]
    EmptySourceList,
    #[error("attempt timed out after {0}s")]
    Timeout(u64),
    #[error("browser session failed: {0}")]
    Browser(String),
}

/// Terminal outcomes of a whole resolution. The caller sees exactly one of
/// these or a complete `StreamResult`.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no streaming servers were found for this content")]
    NoServers,
    #[error("server discovery failed: {0}")]
    Discovery(#[source] NegotiateError),
    #[error("all strategies failed for all available servers")]
    AllStrategiesExhausted,
    #[error("resolution deadline of {0}s exceeded")]
    DeadlineExceeded(u64),
}
