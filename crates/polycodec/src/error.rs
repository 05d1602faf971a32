// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error type shared by the codec core, the configuration layer and formats.

/// Errors returned by polycodec operations.
///
/// Every error is terminal for the call that raised it: no partial value is
/// returned.
///
/// # Example
///
/// ```rust
/// use polycodec::{ByteFormat, CodecConfig, CodecCore, Error};
///
/// let core = CodecCore::new(ByteFormat::new(), CodecConfig::default());
/// match core.decode_from_slice::<u32>(&[0x01]) {
///     Err(Error::MalformedRepresentation(msg)) => println!("bad input: {}", msg),
///     Err(e) => println!("other error: {}", e),
///     Ok(v) => println!("decoded {}", v),
/// }
/// ```
#[derive(Debug)]
pub enum Error {
    // ========================================================================
    // Type resolution errors
    // ========================================================================
    /// Type is not covered by the configured allow-list.
    DisallowedType(String),
    /// A decoded dynamic type tag does not name any known type.
    UnresolvableTypeName(String),
    /// A tagged subtype does not descend from the declared type.
    TypeMismatch { expected: String, found: String },

    // ========================================================================
    // Codec construction errors
    // ========================================================================
    /// The format cannot represent the requested composite shape.
    UnsupportedShape { format: &'static str, reason: String },
    /// The type cannot be instantiated from decoded field values.
    NoUsableConstructor(String),
    /// A placeholder codec was invoked before its target was installed, or
    /// the generation it belongs to kept failing underneath the lookup.
    UninitialisedReference(String),

    // ========================================================================
    // Decode errors
    // ========================================================================
    /// Decoded input names a field the target type does not have.
    UnrecognisedField { type_name: String, field: String },
    /// Decoding finished without a value for a field the constructor needs.
    MissingField { type_name: String, field: String },
    /// Format-level structural violation (truncated input, wrong token, ...).
    MalformedRepresentation(String),

    // ========================================================================
    // Other errors
    // ========================================================================
    /// Configuration is inconsistent (unknown alias target, bad document, ...).
    InvalidConfig(String),
    /// I/O error while reading a configuration document.
    Io(std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::MalformedRepresentation`].
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Error::MalformedRepresentation(msg.into())
    }

    /// Shorthand for [`Error::UnsupportedShape`].
    pub(crate) fn unsupported(format: &'static str, reason: impl Into<String>) -> Self {
        Error::UnsupportedShape {
            format,
            reason: reason.into(),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // Type resolution
            Error::DisallowedType(name) => write!(f, "Type not in allow-list: {}", name),
            Error::UnresolvableTypeName(name) => write!(f, "Unresolvable type name: {}", name),
            Error::TypeMismatch { expected, found } => {
                write!(f, "Type mismatch: expected {}, found {}", expected, found)
            }
            // Codec construction
            Error::UnsupportedShape { format, reason } => {
                write!(f, "Format {} does not support this shape: {}", format, reason)
            }
            Error::NoUsableConstructor(name) => write!(f, "No usable constructor for {}", name),
            Error::UninitialisedReference(name) => {
                write!(f, "Uninitialised codec reference used for {}", name)
            }
            // Decode
            Error::UnrecognisedField { type_name, field } => {
                write!(f, "Unrecognised field '{}' for type {}", field, type_name)
            }
            Error::MissingField { type_name, field } => {
                write!(f, "Missing field '{}' for type {}", field, type_name)
            }
            Error::MalformedRepresentation(msg) => write!(f, "Malformed representation: {}", msg),
            // Other
            Error::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            Error::Io(e) => write!(f, "I/O error: {}", e),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

/// Convenient alias for results using the crate [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;
