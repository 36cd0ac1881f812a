//! Error types for Tidings.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`TidingsError`] - Top-level error type for all Tidings operations
//! - [`UsageError`] - Caller bugs that fail immediately
//! - [`StoreError`] - Configuration store access and (de)serialization
//! - [`ResolveError`] - Listener resolution failures
//! - [`DescriptorError`] - Malformed listener descriptors
//! - [`ListenerError`] - Failures collected on an event during dispatch

use std::path::PathBuf;
use thiserror::Error;

/// A boxed error type returned by listener code.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Tidings operations.
#[derive(Error, Debug)]
pub enum TidingsError {
    /// The API was used incorrectly.
    #[error("usage error: {0}")]
    Usage(#[from] UsageError),

    /// The configuration store failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// A listener could not be resolved.
    #[error("resolve error: {0}")]
    Resolve(#[from] ResolveError),

    /// A listener descriptor is malformed.
    #[error("descriptor error: {0}")]
    Descriptor(#[from] DescriptorError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Protocol misuse. These are caller bugs and are never swallowed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    /// The reserved global pseudo-event was triggered directly.
    #[error("the reserved event `{0}` is fired implicitly and cannot be triggered directly")]
    ReservedEvent(String),

    /// A programmatic subscriber was created without a key.
    #[error("callback key must not be empty")]
    EmptyCallbackKey,

    /// An action name was registered twice on the same table.
    #[error("action `{0}` is already registered")]
    DuplicateAction(String),
}

/// Errors raised by a [`ConfigurationStore`](crate::ConfigurationStore).
#[derive(Error, Debug)]
pub enum StoreError {
    /// Reading or writing the backing file failed.
    #[error("failed to access {}: {source}", .path.display())]
    Io {
        /// File being accessed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The value stored under a key is not a descriptor array.
    #[error("malformed descriptors under `{key}`: {source}")]
    Malformed {
        /// Store key.
        key: String,
        /// Decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// The whole store document could not be decoded or encoded.
    #[error("store document is not valid JSON: {0}")]
    Serialization(#[source] serde_json::Error),
}

/// Errors produced while turning a descriptor into a callable instance.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolveError {
    /// No extension with this name is installed.
    #[error("extension `{0}` is not installed")]
    UnknownExtension(String),

    /// The extension exists but does not ship the library.
    #[error("extension `{extension}` has no library `{library}`")]
    UnknownLibrary {
        /// Extension name.
        extension: String,
        /// Library name.
        library: String,
    },

    /// The resolved instance cannot execute the event it is bound to.
    #[error("listener `{listener}` cannot execute `{event}`")]
    NotExecutable {
        /// Listener key (`extension:library`).
        listener: String,
        /// Event id (`namespace.name`).
        event: String,
    },
}

/// A descriptor that is missing one of its identifying fields.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    /// `extension` is empty.
    #[error("descriptor #{index} has no extension (library `{library}`)")]
    MissingExtension {
        /// Position in the stored array.
        index: usize,
        /// Library named by the descriptor, possibly empty.
        library: String,
    },

    /// `library` is empty.
    #[error("descriptor #{index} of extension `{extension}` has no library")]
    MissingLibrary {
        /// Position in the stored array.
        index: usize,
        /// Extension named by the descriptor.
        extension: String,
    },
}

/// A failure raised by a single listener during dispatch.
///
/// These are appended to [`Event::collector`](crate::Event::collector) and are
/// never returned from a trigger call.
#[derive(Error, Debug)]
pub enum ListenerError {
    /// The listener returned an error.
    #[error("listener `{listener}` failed on `{event}`: {source}")]
    Failed {
        /// Listener key.
        listener: String,
        /// Event id.
        event: String,
        /// Error returned by the listener.
        #[source]
        source: BoxError,
    },

    /// The listener panicked.
    #[error("listener `{listener}` panicked on `{event}`: {message}")]
    Panicked {
        /// Listener key.
        listener: String,
        /// Event id.
        event: String,
        /// Panic payload, when it was a string.
        message: String,
    },
}

impl ListenerError {
    /// Key of the listener that failed.
    pub fn listener(&self) -> &str {
        match self {
            ListenerError::Failed { listener, .. } | ListenerError::Panicked { listener, .. } => {
                listener
            }
        }
    }

    /// Id of the event that was being dispatched.
    pub fn event(&self) -> &str {
        match self {
            ListenerError::Failed { event, .. } | ListenerError::Panicked { event, .. } => event,
        }
    }

    /// Human readable message, including the listener's own error text.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether the failure was a panic rather than a returned error.
    pub fn is_panic(&self) -> bool {
        matches!(self, ListenerError::Panicked { .. })
    }
}

// Convenience conversions
impl From<BoxError> for TidingsError {
    fn from(err: BoxError) -> Self {
        TidingsError::Custom(err)
    }
}
