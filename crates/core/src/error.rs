//! Error types for keylight.

use thiserror::Error;

/// Errors produced by render targets, effects, and scene handling.
#[derive(Debug, Error)]
pub enum KeylightError {
    /// Storage for a render target could not be obtained.
    #[error("cannot allocate render target for {requested} entries")]
    AllocationFailed { requested: usize },

    /// A checked element access went past the logical size.
    #[error("index {index} out of bounds for render target of {len} entries")]
    OutOfBounds { index: usize, len: usize },

    /// A color string could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// The requested effect name is not registered.
    #[error("unknown effect: {0}")]
    UnknownEffect(String),

    /// The requested compositing backend name is not recognised.
    #[error("unknown backend: {0}")]
    UnknownBackend(String),

    /// The compositing backend exists but this CPU cannot run it.
    #[error("backend '{0}' is not supported on this CPU")]
    UnsupportedBackend(&'static str),

    /// A scene description failed validation.
    #[error("invalid scene: {0}")]
    InvalidScene(String),

    /// A file could not be read.
    #[error("I/O error: {0}")]
    Io(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocation_failed_includes_requested_size() {
        let err = KeylightError::AllocationFailed { requested: 12345 };
        let msg = format!("{err}");
        assert!(msg.contains("12345"), "missing size in: {msg}");
    }

    #[test]
    fn out_of_bounds_includes_index_and_len() {
        let err = KeylightError::OutOfBounds { index: 9, len: 6 };
        let msg = format!("{err}");
        assert!(msg.contains('9'), "missing index in: {msg}");
        assert!(msg.contains('6'), "missing len in: {msg}");
    }

    #[test]
    fn invalid_color_includes_message() {
        let err = KeylightError::InvalidColor("bad hex".into());
        let msg = format!("{err}");
        assert!(msg.contains("bad hex"), "missing message in: {msg}");
    }

    #[test]
    fn unknown_effect_includes_name() {
        let err = KeylightError::UnknownEffect("rainbow".into());
        assert!(err.to_string().contains("rainbow"));
    }

    #[test]
    fn unsupported_backend_names_backend() {
        let err = KeylightError::UnsupportedBackend("avx2");
        let msg = err.to_string();
        assert!(msg.contains("avx2") && msg.contains("not supported"), "got: {msg}");
    }

    #[test]
    fn keylight_error_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<KeylightError>();
    }

    #[test]
    fn keylight_error_implements_std_error() {
        fn assert_std_error<T: std::error::Error>() {}
        assert_std_error::<KeylightError>();
    }
}
