use backtrace::Backtrace;
use parking_lot::Mutex;
use std::error::Error;
use std::fmt::{Debug, Display, Formatter};
use std::sync::Arc;

/// Error kinds for catalog lookup operations.
///
/// Each kind names one category of failure so callers can react to it
/// without parsing messages.
///
/// # Examples
///
/// ```rust
/// use geocat::errors::{CatalogError, CatalogResult, ErrorKind};
///
/// fn example() -> CatalogResult<()> {
///     Err(CatalogError::new("Unknown catalog type", ErrorKind::IllegalArgument))
/// }
///
/// assert_eq!(example().unwrap_err().kind(), &ErrorKind::IllegalArgument);
/// ```
#[derive(Debug, PartialEq, Eq, Clone)]
pub enum ErrorKind {
    /// The caller passed an unknown type, a malformed filter or an
    /// inconsistent argument
    IllegalArgument,
    /// An entity required by a write (e.g. the target of an update) is absent
    NotFound,
    /// A unique index already holds the key
    DuplicateKey,
    /// An index with the same name is already registered
    IndexAlreadyExists,
    /// A named index is not registered
    IndexNotFound,
    /// The full-text index is closed or was never opened
    IndexNotRunning,
    /// The operation is not supported by this view (e.g. writes on a union)
    UnsupportedOperation,
    /// Generic IO error
    IOError,
    /// Error decoding persisted entities
    EncodingError,
    /// Error from an extension crate (e.g. "FTS")
    Extension(String),
    /// Internal error (usually indicates a bug)
    InternalError,
}

impl Display for ErrorKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::IllegalArgument => write!(f, "Illegal argument"),
            ErrorKind::NotFound => write!(f, "Not found"),
            ErrorKind::DuplicateKey => write!(f, "Duplicate key"),
            ErrorKind::IndexAlreadyExists => write!(f, "Index already exists"),
            ErrorKind::IndexNotFound => write!(f, "Index not found"),
            ErrorKind::IndexNotRunning => write!(f, "Index not running"),
            ErrorKind::UnsupportedOperation => write!(f, "Unsupported operation"),
            ErrorKind::IOError => write!(f, "IO error"),
            ErrorKind::EncodingError => write!(f, "Encoding error"),
            ErrorKind::Extension(name) => write!(f, "{} error", name),
            ErrorKind::InternalError => write!(f, "Internal error"),
        }
    }
}

/// Catalog error type.
///
/// `CatalogError` carries a message, a kind, an optional cause and the
/// backtrace captured where the error was created.
///
/// # Examples
///
/// ```rust
/// use geocat::errors::{CatalogError, ErrorKind};
///
/// let cause = CatalogError::new("disk unplugged", ErrorKind::IOError);
/// let err = CatalogError::new_with_cause("Commit failed", ErrorKind::Extension("FTS".into()), cause);
/// assert!(err.cause().is_some());
/// ```
#[derive(Clone)]
pub struct CatalogError {
    message: String,
    error_kind: ErrorKind,
    cause: Option<Box<CatalogError>>,
    backtrace: Arc<Mutex<Backtrace>>,
}

impl CatalogError {
    /// Creates a new `CatalogError` with the specified message and kind.
    pub fn new(message: &str, error_kind: ErrorKind) -> Self {
        CatalogError {
            message: message.to_string(),
            error_kind,
            cause: None,
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    /// Creates a new `CatalogError` chained to the error that caused it.
    pub fn new_with_cause(message: &str, error_kind: ErrorKind, cause: CatalogError) -> Self {
        CatalogError {
            message: message.to_string(),
            error_kind,
            cause: Some(Box::new(cause)),
            backtrace: Arc::new(Mutex::new(Backtrace::new_unresolved())),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.error_kind
    }

    pub fn cause(&self) -> Option<&CatalogError> {
        self.cause.as_deref()
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Debug for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.cause {
            Some(cause) => write!(f, "{}: {}\nCaused by: {:?}", self.error_kind, self.message, cause),
            None => {
                let mut backtrace = self.backtrace.lock();
                backtrace.resolve();
                write!(f, "{}: {}\n{:?}", self.error_kind, self.message, backtrace)
            }
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.cause {
            Some(cause) => Some(cause.as_ref()),
            None => None,
        }
    }
}

/// A result type alias for catalog operations.
pub type CatalogResult<T> = Result<T, CatalogError>;

impl From<std::io::Error> for CatalogError {
    fn from(err: std::io::Error) -> Self {
        CatalogError::new(&format!("IO error: {}", err), ErrorKind::IOError)
    }
}

impl From<serde_json::Error> for CatalogError {
    fn from(err: serde_json::Error) -> Self {
        CatalogError::new(
            &format!("Failed to decode catalog entity: {}", err),
            ErrorKind::EncodingError,
        )
    }
}
