use std::fmt;

/// Machine-readable error codes for scripting-friendly decision making.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    ConfigParseError,
    FetchFailed,
    DecodeFailed,
    ServerError,
    StoreReadFailed,
    StoreWriteFailed,
    DbCorrupt,
    IllegalTransition,
    InternalUnexpected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::ConfigParseError => "E1001",
            Self::FetchFailed => "E2001",
            Self::DecodeFailed => "E2002",
            Self::ServerError => "E2003",
            Self::StoreReadFailed => "E3001",
            Self::StoreWriteFailed => "E3002",
            Self::DbCorrupt => "E3003",
            Self::IllegalTransition => "E4001",
            Self::InternalUnexpected => "E9001",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::ConfigParseError => "Config file parse error",
            Self::FetchFailed => "Timeline fetch failed",
            Self::DecodeFailed => "Server response decode failed",
            Self::ServerError => "Server returned an error status",
            Self::StoreReadFailed => "Local status store read failed",
            Self::StoreWriteFailed => "Local status store write failed",
            Self::DbCorrupt => "Corrupt status database",
            Self::IllegalTransition => "Illegal state machine transition",
            Self::InternalUnexpected => "Internal unexpected error",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::ConfigParseError => Some("Fix syntax in flock.toml and retry."),
            Self::FetchFailed => Some("Check network connectivity and the configured server."),
            Self::DecodeFailed => Some("The server may be incompatible; verify the base URL."),
            Self::ServerError => Some("Retry later; the server may be rate-limiting."),
            Self::StoreReadFailed => None,
            Self::StoreWriteFailed => Some("Check disk space and write permissions."),
            Self::DbCorrupt => Some("Run `flock doctor` to inspect, or delete the db to refetch."),
            Self::IllegalTransition => Some("This is a bug in flock; please report it with logs."),
            Self::InternalUnexpected => Some("Retry once. If persistent, report a bug with logs."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Failure surfaced by the fetch boundary.
///
/// Fully contained within the originating state machine: a `FetchError`
/// becomes a `Failed` state plus a retained value for display, never an
/// error that unwinds through the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("server returned status {0}")]
    Server(u16),
}

impl FetchError {
    /// Map this failure to its stable [`ErrorCode`].
    #[must_use]
    pub const fn error_code(&self) -> ErrorCode {
        match self {
            Self::Network(_) => ErrorCode::FetchFailed,
            Self::Decode(_) => ErrorCode::DecodeFailed,
            Self::Server(_) => ErrorCode::ServerError,
        }
    }
}

/// Store query failure. Aborts only the current reconciliation pass; the
/// previously rendered sequence stays applied until the next notification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("store read failed: {0}")]
pub struct StoreReadError(pub String);

/// A caller requested a transition the table does not permit.
///
/// Programming error, not a runtime fault: rejected as a no-op and
/// reported via `tracing`, never a panic and never corrupted state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal transition from {from} to {to}")]
pub struct IllegalTransition {
    pub from: &'static str,
    pub to: &'static str,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
