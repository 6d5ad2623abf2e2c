//! Error taxonomy for the display pipeline.
//!
//! Configuration problems are fatal at startup, oversized requests are
//! refused without touching the bus, and transport faults are unrecoverable:
//! the panel is write-only, so a failed transfer is never retried.

use core::fmt;

/// Errors raised by a [`PanelTransport`](crate::transport::PanelTransport).
///
/// `E` is the bus-level error of the concrete transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportError<E> {
    /// The bus reported a failed transaction. Treat as fatal.
    Fault(E),
    /// A single transfer larger than the configured maximum was requested.
    Oversized { requested: usize, max: usize },
    /// Every transaction descriptor in the pool is already queued.
    QueueFull { depth: usize },
}

impl<E: fmt::Debug> fmt::Display for TransportError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fault(e) => write!(f, "transport fault: {:?}", e),
            Self::Oversized { requested, max } => {
                write!(f, "transfer of {} bytes exceeds maximum of {}", requested, max)
            }
            Self::QueueFull { depth } => write!(f, "transaction queue full (depth {})", depth),
        }
    }
}

/// Invalid panel or buffer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Panel width or height is zero.
    ZeroSize,
    /// Strip height of zero lines.
    ZeroStrip,
    /// One strip of `strip_bytes` does not fit in a single transfer.
    StripTooTall { strip_bytes: usize, max: usize },
    /// Backing storage does not match `width * height`.
    BufferSize { expected: usize, actual: usize },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZeroSize => f.write_str("panel size must be non-zero"),
            Self::ZeroStrip => f.write_str("strip height must be non-zero"),
            Self::StripTooTall { strip_bytes, max } => write!(
                f,
                "strip of {} bytes exceeds max transfer size {}",
                strip_bytes, max
            ),
            Self::BufferSize { expected, actual } => write!(
                f,
                "frame buffer holds {} pixels, expected {}",
                actual, expected
            ),
        }
    }
}

/// Top-level pipeline error, generic over the transport's bus error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelError<E> {
    Transport(TransportError<E>),
    Config(ConfigError),
    /// Rectangle outside the panel, empty, or not covered by its pixel source.
    OutOfBounds,
    /// Flip controller phase called out of order.
    InvalidState,
    /// Reset or backlight pin could not be driven.
    Gpio,
}

impl<E> From<TransportError<E>> for PanelError<E> {
    fn from(e: TransportError<E>) -> Self {
        Self::Transport(e)
    }
}

impl<E> From<ConfigError> for PanelError<E> {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

impl<E: fmt::Debug> fmt::Display for PanelError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport(e) => write!(f, "{}", e),
            Self::Config(e) => write!(f, "configuration: {}", e),
            Self::OutOfBounds => f.write_str("rectangle out of bounds"),
            Self::InvalidState => f.write_str("flip phase called out of order"),
            Self::Gpio => f.write_str("control pin error"),
        }
    }
}

impl<E> PanelError<E> {
    /// True for faults the caller must not try to recover from.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Transport(TransportError::Fault(_)) | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn oversized_message_names_both_sizes() {
        let e: TransportError<()> = TransportError::Oversized { requested: 20480, max: 10240 };
        assert_eq!(e.to_string(), "transfer of 20480 bytes exceeds maximum of 10240");
    }

    #[test]
    fn only_faults_and_config_are_fatal() {
        assert!(PanelError::Transport(TransportError::Fault(())).is_fatal());
        assert!(PanelError::<()>::Config(ConfigError::ZeroSize).is_fatal());
        assert!(!PanelError::<()>::OutOfBounds.is_fatal());
        assert!(!PanelError::<()>::from(TransportError::QueueFull { depth: 7 }).is_fatal());
    }
}
