use crate::ColorError;
use std::fmt;

/// Error while loading a document or encoding the rendered surface
#[derive(Debug)]
pub enum Error {
    /// Markup is not a well formed XML document
    Xml(roxmltree::Error),
    /// Document does not have a root `svg` element
    NoRoot(String),
    /// Color value could not be parsed
    Color(ColorError),
    /// IO error propagated while reading input or writing output
    IoError(std::io::Error),
    /// PNG encoding error
    #[cfg(feature = "png")]
    PngEncoding(png::EncodingError),
    /// PNG decoding error
    #[cfg(feature = "png")]
    PngDecoding(png::DecodingError),
    /// JSON error
    #[cfg(feature = "serde")]
    Json(serde_json::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Xml(error) => write!(f, "failed to parse markup: {}", error),
            Error::NoRoot(tag) => write!(f, "expected root <svg> element, found <{}>", tag),
            Error::Color(error) => write!(f, "{}", error),
            Error::IoError(error) => write!(f, "{}", error),
            #[cfg(feature = "png")]
            Error::PngEncoding(error) => write!(f, "{}", error),
            #[cfg(feature = "png")]
            Error::PngDecoding(error) => write!(f, "{}", error),
            #[cfg(feature = "serde")]
            Error::Json(error) => write!(f, "{}", error),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Xml(error) => Some(error),
            Error::Color(error) => Some(error),
            Error::IoError(error) => Some(error),
            #[cfg(feature = "png")]
            Error::PngEncoding(error) => Some(error),
            #[cfg(feature = "png")]
            Error::PngDecoding(error) => Some(error),
            #[cfg(feature = "serde")]
            Error::Json(error) => Some(error),
            Error::NoRoot(_) => None,
        }
    }
}

impl From<roxmltree::Error> for Error {
    fn from(error: roxmltree::Error) -> Self {
        Self::Xml(error)
    }
}

impl From<ColorError> for Error {
    fn from(error: ColorError) -> Self {
        Self::Color(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Self::IoError(error)
    }
}

#[cfg(feature = "png")]
impl From<png::EncodingError> for Error {
    fn from(error: png::EncodingError) -> Self {
        Self::PngEncoding(error)
    }
}

#[cfg(feature = "png")]
impl From<png::DecodingError> for Error {
    fn from(error: png::DecodingError) -> Self {
        Self::PngDecoding(error)
    }
}

#[cfg(feature = "serde")]
impl From<serde_json::Error> for Error {
    fn from(error: serde_json::Error) -> Self {
        Self::Json(error)
    }
}

impl From<Error> for std::io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::IoError(error) => error,
            _ => Self::new(std::io::ErrorKind::InvalidData, error),
        }
    }
}
