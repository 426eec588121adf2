//! Error types for P-Touch printer operations.
//!
//! Every failure the driver can report is a variant of [`Error`]. Callers that
//! only care about the broad category can use [`Error::kind`].

use crate::status::{ErrorInformation1, ErrorInformation2};
use thiserror::Error;

/// Main error type for P-Touch printer operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Socket or device I/O failed.
    ///
    /// Covers refused or unreachable RFCOMM channels as well as a connection
    /// that breaks while a job is being streamed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// USB communication error.
    #[error(transparent)]
    UsbError(#[from] rusb::Error),

    #[error("Device is offline")]
    DeviceOffline,

    #[error("Device is missing endpoint")]
    MissingEndpoint,

    #[error("Bluetooth transport is not supported on this platform")]
    Unsupported,

    /// A status read returned something other than 32 bytes.
    #[error("Expected 32 bytes, but only received {0}")]
    InvalidResponse(usize),

    #[error("Wrote {written} of {expected} bytes, possibly timeout")]
    IncompleteWrite { written: usize, expected: usize },

    #[error("Unknown status type 0x{0:02X}")]
    UnknownStatusType(u8),

    #[error("Unknown phase type 0x{0:02X}")]
    UnknownPhaseType(u8),

    /// The printer reported an error condition.
    #[error("Printer error: {error_1:?}, {error_2:?}")]
    DeviceFault {
        error_1: ErrorInformation1,
        error_2: ErrorInformation2,
    },

    #[error("Device was turned off")]
    TurnedOff,

    /// The bitmap does not match the installed tape.
    #[error("Image height is {actual} pixels, {expected} required for the current media width")]
    SizeMismatch { expected: u32, actual: u32 },

    #[error("Unsupported media width {0}mm")]
    UnsupportedMediaWidth(u8),

    /// A print job was started before any status reply reported the tape.
    #[error("Media width is unknown, request status first")]
    MediaWidthUnknown,

    #[error("Invalid bluetooth address {0:?}")]
    InvalidAddress(String),

    #[error(transparent)]
    Image(#[from] image::ImageError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Broad failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Connection failed, short read or broken stream.
    Transport,
    /// The device sent something this driver does not understand.
    ProtocolViolation,
    /// The device reported a fault or powered down.
    DeviceFault,
    /// The bitmap has the wrong height for the installed tape.
    SizeMismatch,
    /// Unknown tape width, bad address or unreadable input.
    Configuration,
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Io(_)
            | Self::UsbError(_)
            | Self::DeviceOffline
            | Self::MissingEndpoint
            | Self::Unsupported
            | Self::InvalidResponse(_)
            | Self::IncompleteWrite { .. } => ErrorKind::Transport,
            Self::UnknownStatusType(_) | Self::UnknownPhaseType(_) => {
                ErrorKind::ProtocolViolation
            }
            Self::DeviceFault { .. } | Self::TurnedOff => ErrorKind::DeviceFault,
            Self::SizeMismatch { .. } => ErrorKind::SizeMismatch,
            Self::UnsupportedMediaWidth(_)
            | Self::MediaWidthUnknown
            | Self::InvalidAddress(_)
            | Self::Image(_)
            | Self::Json(_) => ErrorKind::Configuration,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(Error::InvalidResponse(3).kind(), ErrorKind::Transport);
        assert_eq!(
            Error::UnknownStatusType(0x03).kind(),
            ErrorKind::ProtocolViolation
        );
        assert_eq!(Error::TurnedOff.kind(), ErrorKind::DeviceFault);
        assert_eq!(
            Error::SizeMismatch {
                expected: 70,
                actual: 64
            }
            .kind(),
            ErrorKind::SizeMismatch
        );
        assert_eq!(
            Error::UnsupportedMediaWidth(36).kind(),
            ErrorKind::Configuration
        );
    }

    #[test]
    fn short_read_message() {
        assert_eq!(
            Error::InvalidResponse(12).to_string(),
            "Expected 32 bytes, but only received 12"
        );
    }
}
