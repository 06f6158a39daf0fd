/*!
 * Error types for taskctx
 */

use std::io;
use taskctx_transport::TransportError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProxyError>;

/// Coarse classification of a `ProxyError`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A named task, port, attribute or property does not exist
    NotFound,
    /// The remote call mechanism failed
    Transport,
    /// A proxy was used after its owning task context was released
    Usage,
    /// Invalid configuration
    Config,
    /// Local I/O failure (configuration files, log files)
    Io,
}

#[derive(Error, Debug)]
pub enum ProxyError {
    #[error("task context '{0}' not found")]
    TaskNotFound(String),

    #[error("task {task} does not have a '{port}' port")]
    PortNotFound { task: String, port: String },

    #[error("task {task} has no attribute or property named '{name}'")]
    AttributeNotFound { task: String, name: String },

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    #[error("usage error: {0}")]
    Usage(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl ProxyError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProxyError::TaskNotFound(_)
            | ProxyError::PortNotFound { .. }
            | ProxyError::AttributeNotFound { .. } => ErrorKind::NotFound,
            ProxyError::Transport(_) => ErrorKind::Transport,
            ProxyError::Usage(_) => ErrorKind::Usage,
            ProxyError::Config(_) => ErrorKind::Config,
            ProxyError::Io(_) => ErrorKind::Io,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// The underlying transport failure, if any
    pub fn transport_error(&self) -> Option<&TransportError> {
        match self {
            ProxyError::Transport(e) => Some(e),
            _ => None,
        }
    }
}

/// Maps transport failures of a lookup onto the proxy error taxonomy
///
/// Unresolved names and nil references become the `NotFound` error built by
/// `not_found`; every other failure is kept as `ProxyError::Transport`.
pub(crate) trait LookupExt<T> {
    fn or_not_found(self, not_found: impl FnOnce() -> ProxyError) -> Result<T>;
}

impl<T> LookupExt<T> for std::result::Result<T, TransportError> {
    fn or_not_found(self, not_found: impl FnOnce() -> ProxyError) -> Result<T> {
        self.map_err(|err| {
            if err.is_unresolved() {
                not_found()
            } else {
                ProxyError::Transport(err)
            }
        })
    }
}

/// Same mapping for lookups where a nil reference comes back as `Ok(None)`
pub(crate) trait PresenceExt<T> {
    fn present_or_not_found(self, not_found: impl FnOnce() -> ProxyError) -> Result<T>;
}

impl<T> PresenceExt<T> for std::result::Result<Option<T>, TransportError> {
    fn present_or_not_found(self, not_found: impl FnOnce() -> ProxyError) -> Result<T> {
        match self {
            Ok(Some(value)) => Ok(value),
            Ok(None) => Err(not_found()),
            Err(err) if err.is_unresolved() => Err(not_found()),
            Err(err) => Err(ProxyError::Transport(err)),
        }
    }
}
