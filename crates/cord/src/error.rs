// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error types for resource directory lookups.

use crate::client::LookupKind;
use crate::filter::MAX_FILTER_COMPONENT;
use crate::link::LinkError;
use std::fmt;
use std::io;

/// Result type for lookup operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during a resource directory lookup.
///
/// Every variant is a recoverable return value; a failed lookup leaves the
/// directory handle usable for the next call.
#[derive(Debug)]
pub enum Error {
    /// No response arrived before the transport gave up waiting
    Timeout,

    /// Response body was at least as large as the result buffer
    /// (the response is discarded, never partially copied)
    Overflow,

    /// No matching resource: empty payload, unexpected media type, or
    /// pagination exhausted
    NoResource,

    /// Request build or send failure
    Io(io::Error),

    /// Response payload could not be decoded as link-format
    Decode(LinkError),

    /// Lookup attempted before bootstrap discovered an interface of this kind
    InterfaceNotDiscovered(LookupKind),

    /// Filter key or value longer than [`MAX_FILTER_COMPONENT`] bytes
    FilterTooLong(usize),

    /// Completion path broke down (transport dropped the callback unsignaled)
    Internal(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Timeout => write!(f, "lookup timed out"),
            Self::Overflow => write!(f, "response larger than result buffer"),
            Self::NoResource => write!(f, "no matching resource"),
            Self::Io(e) => write!(f, "I/O error: {}", e),
            Self::Decode(e) => write!(f, "link-format decode failed: {}", e),
            Self::InterfaceNotDiscovered(kind) => {
                write!(f, "{} lookup interface not discovered", kind)
            }
            Self::FilterTooLong(len) => write!(
                f,
                "filter key/value of {} bytes exceeds the {}-byte limit",
                len, MAX_FILTER_COMPONENT
            ),
            Self::Internal(msg) => write!(f, "internal lookup error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Decode(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Decode(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InterfaceNotDiscovered(LookupKind::Resource);
        assert!(err.to_string().contains("resource lookup interface"));

        let err = Error::FilterTooLong(40);
        assert!(err.to_string().contains("40 bytes"));

        let err = Error::Overflow;
        assert!(err.to_string().contains("result buffer"));
    }

    #[test]
    fn test_error_source() {
        use std::error::Error as _;

        let err = Error::from(io::Error::new(io::ErrorKind::Other, "boom"));
        assert!(err.source().is_some());

        assert!(Error::Timeout.source().is_none());
    }
}
