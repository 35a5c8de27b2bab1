//! Microphone permission and device errors.

use std::fmt;

/// Cause of a failed microphone request, keyed by `DOMException` name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum MediaErrorKind {
    /// The user or browser policy denied microphone access
    PermissionDenied,
    /// No microphone is connected
    NotFound,
    /// The microphone is in use by another application or failed to start
    NotReadable,
    /// The requested constraints cannot be satisfied by any device
    Overconstrained,
    /// Media access is blocked, usually because the page is not served over HTTPS
    Security,
    /// The request was cancelled
    Aborted,
    /// The constraints passed to the device request were malformed
    InvalidConstraints,
    /// Recording is not supported in this environment
    NotSupported,
    /// Any other failure, with its raw name
    Unknown(String),
}

impl MediaErrorKind {
    /// Classify a `DOMException` (or `Error`) name.
    ///
    /// # Example
    ///
    /// ```
    /// use gradian_client::voice::MediaErrorKind;
    ///
    /// assert_eq!(MediaErrorKind::from_name("NotAllowedError"), MediaErrorKind::PermissionDenied);
    /// assert_eq!(MediaErrorKind::from_name("TrackStartError"), MediaErrorKind::NotReadable);
    /// ```
    pub fn from_name(name: &str) -> Self {
        match name.trim() {
            "NotAllowedError" | "PermissionDeniedError" => MediaErrorKind::PermissionDenied,
            "NotFoundError" | "DevicesNotFoundError" => MediaErrorKind::NotFound,
            "NotReadableError" | "TrackStartError" => MediaErrorKind::NotReadable,
            "OverconstrainedError" | "ConstraintNotSatisfiedError" => {
                MediaErrorKind::Overconstrained
            }
            "SecurityError" => MediaErrorKind::Security,
            "AbortError" => MediaErrorKind::Aborted,
            "TypeError" => MediaErrorKind::InvalidConstraints,
            "NotSupportedError" => MediaErrorKind::NotSupported,
            other => MediaErrorKind::Unknown(other.to_string()),
        }
    }

    /// The `DOMException` name this kind is reported under.
    pub fn name(&self) -> &str {
        match self {
            MediaErrorKind::PermissionDenied => "NotAllowedError",
            MediaErrorKind::NotFound => "NotFoundError",
            MediaErrorKind::NotReadable => "NotReadableError",
            MediaErrorKind::Overconstrained => "OverconstrainedError",
            MediaErrorKind::Security => "SecurityError",
            MediaErrorKind::Aborted => "AbortError",
            MediaErrorKind::InvalidConstraints => "TypeError",
            MediaErrorKind::NotSupported => "NotSupportedError",
            MediaErrorKind::Unknown(name) => name,
        }
    }

    /// User-facing remediation message.
    pub fn message(&self) -> &'static str {
        match self {
            MediaErrorKind::PermissionDenied => {
                "Microphone access was denied. Allow microphone access in your browser settings and try again."
            }
            MediaErrorKind::NotFound => {
                "No microphone was found. Connect a microphone and try again."
            }
            MediaErrorKind::NotReadable => {
                "The microphone is in use by another application. Close other applications using it and try again."
            }
            MediaErrorKind::Overconstrained => {
                "No microphone matches the requested settings. Try a different microphone."
            }
            MediaErrorKind::Security => {
                "Microphone access is blocked. Make sure the page is served over HTTPS."
            }
            MediaErrorKind::Aborted => "The microphone request was cancelled.",
            MediaErrorKind::InvalidConstraints => {
                "The microphone request was invalid. Reload the page and try again."
            }
            MediaErrorKind::NotSupported => {
                "Audio recording is not supported in this browser. Try a recent version of Chrome, Firefox, Edge or Safari."
            }
            MediaErrorKind::Unknown(_) => {
                "Could not access the microphone. Check your device and try again."
            }
        }
    }
}

impl fmt::Display for MediaErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}
