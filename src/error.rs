use std::fmt;

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for the application
#[derive(Debug)]
pub enum Error {
    IoError(std::io::Error),
    /// Connection, timeout or body read failure
    Transport { url: String, message: String },
    /// The server answered with a non-2xx status
    Status { url: String, status: u16 },
    /// The body was not valid JSON or did not match the expected document shape
    Decode { url: String, message: String },
    /// A referenced type could not be fetched or translated
    SchemaResolution { type_name: String, source: Box<Error> },
    /// A collection's metadata lacks a field the hypermedia convention requires
    Convention { collection: String, message: String },
    InvalidArgument(String),
    SerializationError(String),
}

impl Error {
    /// Wraps a lower-level failure as a resolution error for `type_name`
    pub fn resolution(type_name: &str, source: Error) -> Self {
        Error::SchemaResolution {
            type_name: type_name.to_string(),
            source: Box::new(source),
        }
    }

    pub fn convention(collection: &str, message: impl Into<String>) -> Self {
        Error::Convention {
            collection: collection.to_string(),
            message: message.into(),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::IoError(e) => write!(f, "IO error: {}", e),
            Error::Transport { url, message } => {
                write!(f, "request to {} failed: {}", url, message)
            }
            Error::Status { url, status } => {
                write!(f, "request to {} returned status {}", url, status)
            }
            Error::Decode { url, message } => {
                write!(f, "invalid document from {}: {}", url, message)
            }
            Error::SchemaResolution { type_name, source } => {
                write!(f, "cannot resolve schema for `{}`: {}", type_name, source)
            }
            Error::Convention { collection, message } => {
                write!(f, "collection `{}` breaks convention: {}", collection, message)
            }
            Error::InvalidArgument(msg) => write!(f, "invalid argument: {}", msg),
            Error::SerializationError(msg) => write!(f, "serialization error: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(e) => Some(e),
            Error::SchemaResolution { source, .. } => Some(source.as_ref()),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IoError(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::SerializationError(format!("JSON serialization error: {}", err))
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(err: serde_yaml::Error) -> Self {
        Error::SerializationError(format!("YAML serialization error: {}", err))
    }
}
