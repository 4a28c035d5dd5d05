//! Application error type.
//!
//! A single error struct carries both a machine-checkable kind (so callers can
//! distinguish "bad request" from "provider returned nothing") and a
//! human-readable message for the status line / stderr.

/// Classification of pipeline failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller-input mistake (empty ticker, start date after end date).
    /// Surfaced before any network fetch is attempted.
    InvalidRequest,
    /// Bad moving-average window size (zero).
    InvalidWindow,
    /// Provider returned no rows for the request, or the request could not be
    /// carried out at all (transport failure, provider-side error).
    EmptyData,
    /// Provider rows are structurally unusable (missing columns, duplicate or
    /// non-monotonic timestamps after sorting).
    MalformedData,
    /// Terminal / rendering failure.
    Render,
    /// Local file I/O failure (CSV export).
    Io,
}

impl ErrorKind {
    /// Process exit code for the one-shot CLI path.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::InvalidRequest | ErrorKind::InvalidWindow | ErrorKind::Io => 2,
            ErrorKind::EmptyData | ErrorKind::MalformedData | ErrorKind::Render => 4,
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidRequest, message)
    }

    pub fn invalid_window(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidWindow, message)
    }

    pub fn empty_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::EmptyData, message)
    }

    pub fn malformed_data(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::MalformedData, message)
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Render, message)
    }

    pub fn io(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Io, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
