//! Errors produced by progressors and progressive collections.

use std::{error::Error as StdError, sync::Arc};

use derive_more::Display;

/// Any error that may occur while working with progressors and progressive
/// collections.
#[derive(Clone, Debug, Display)]
pub enum Error {
    /// Mutating member was called on a read-only progressive view.
    #[display(fmt = "`{}` is not supported by a read-only progressive view", _0)]
    NotSupported(&'static str),

    /// Key is absent even after the whole source has been pulled.
    #[display(fmt = "key was not present in the progressive collection")]
    KeyNotFound,

    /// Index points past the end of a fully materialized collection.
    #[display(fmt = "index {} is out of range for length {}", index, len)]
    IndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Length of the collection after full materialization.
        len: usize,
    },

    /// Target slice can't hold all the materialized items.
    #[display(
        fmt = "target slice has room for {} items, but {} are required",
        available,
        required
    )]
    InsufficientSpace {
        /// Number of items to be copied.
        required: usize,
        /// Number of items the target slice is able to hold.
        available: usize,
    },

    /// Upstream error which aborted a progressor.
    #[display(fmt = "progressor source failed: {}", _0)]
    Source(Arc<dyn StdError + Send + Sync>),
}

impl Error {
    /// Wraps the provided upstream error into an [`Error::Source`].
    #[inline]
    pub fn source_error<E>(err: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::Source(Arc::new(err))
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::NotSupported(a), Self::NotSupported(b)) => a == b,
            (Self::KeyNotFound, Self::KeyNotFound) => true,
            (
                Self::IndexOutOfRange { index, len },
                Self::IndexOutOfRange {
                    index: other_index,
                    len: other_len,
                },
            ) => index == other_index && len == other_len,
            (
                Self::InsufficientSpace {
                    required,
                    available,
                },
                Self::InsufficientSpace {
                    required: other_required,
                    available: other_available,
                },
            ) => required == other_required && available == other_available,
            (Self::Source(a), Self::Source(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Self::Source(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

#[cfg(test)]
mod error_spec {
    use std::{error::Error as _, io};

    use super::Error;

    #[test]
    fn displays_member_of_unsupported_operation() {
        assert_eq!(
            Error::NotSupported("add").to_string(),
            "`add` is not supported by a read-only progressive view",
        );
    }

    #[test]
    fn exposes_upstream_error_as_source() {
        let err = Error::source_error(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream ended",
        ));

        assert_eq!(err.to_string(), "progressor source failed: stream ended");
        assert!(err.source().is_some());
        assert!(Error::KeyNotFound.source().is_none());
    }

    #[test]
    fn source_errors_are_equal_only_when_shared() {
        let err = Error::source_error(io::Error::from(io::ErrorKind::Other));
        let other = Error::source_error(io::Error::from(io::ErrorKind::Other));

        assert_eq!(err, err.clone());
        assert_ne!(err, other);
    }

    #[test]
    fn debug_output_keeps_upstream_details() {
        let err = Error::source_error(io::Error::new(
            io::ErrorKind::UnexpectedEof,
            "stream ended",
        ));

        let debug = format!("{:?}", err);
        assert!(debug.starts_with("Source("));
        assert!(debug.contains("UnexpectedEof"));
        assert_eq!(
            format!("{:?}", Error::IndexOutOfRange { index: 3, len: 1 }),
            "IndexOutOfRange { index: 3, len: 1 }",
        );
    }
}
