//! Errors returned by channel parsing.

use thiserror::Error;

use crate::net::{AddressError, InterfaceError};
use crate::uri::{ParamError, UriError};

/// Coarse classification of a [`ChannelError`].
///
/// Callers that reject a client request usually only need the kind; the
/// error itself carries the offending key and value for the message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedUri,
    DuplicateParameter,
    InvalidParameterValue,
    ConflictingParameters,
    MissingParameter,
    AddressResolutionFailure,
    UnsupportedMedia,
}

/// Why a channel URI could not be turned into a channel.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The URI is longer than the configured bound.
    #[error("channel uri length {length} exceeds maximum {max}")]
    UriTooLong { length: usize, max: usize },
    /// Scheme, media or parameter structure could not be parsed.
    #[error("malformed channel uri: {reason}")]
    MalformedUri { reason: String },
    /// A parameter key appears more than once.
    #[error("duplicate parameter `{key}`")]
    DuplicateParameter { key: String },
    /// A value failed type or range validation.
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    InvalidParameterValue {
        key: &'static str,
        value: String,
        reason: String,
    },
    /// Two parameters that cannot be used together.
    #[error("conflicting parameters `{first}` and `{second}`")]
    ConflictingParameters {
        first: &'static str,
        second: &'static str,
    },
    /// A parameter required by the rest of the URI is absent.
    #[error("missing required parameter `{key}`")]
    MissingParameter { key: &'static str },
    /// A host or interface could not be resolved to a local or remote address.
    #[error("could not resolve {key}=`{value}`: {reason}")]
    AddressResolutionFailure {
        key: &'static str,
        value: String,
        reason: String,
    },
    /// The media is not `udp`.
    #[error("unsupported media `{media}` for a UDP channel")]
    UnsupportedMedia { media: String },
}

impl ChannelError {
    /// The error's kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UriTooLong { .. } | Self::MalformedUri { .. } => ErrorKind::MalformedUri,
            Self::DuplicateParameter { .. } => ErrorKind::DuplicateParameter,
            Self::InvalidParameterValue { .. } => ErrorKind::InvalidParameterValue,
            Self::ConflictingParameters { .. } => ErrorKind::ConflictingParameters,
            Self::MissingParameter { .. } => ErrorKind::MissingParameter,
            Self::AddressResolutionFailure { .. } => ErrorKind::AddressResolutionFailure,
            Self::UnsupportedMedia { .. } => ErrorKind::UnsupportedMedia,
        }
    }

    /// Wraps an address error for parameter `key`.
    pub(crate) fn address(key: &'static str, value: &str, err: &AddressError) -> Self {
        if err.is_resolution() {
            Self::AddressResolutionFailure {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::InvalidParameterValue {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            }
        }
    }

    /// Wraps an interface error for parameter `key`.
    pub(crate) fn interface(key: &'static str, value: &str, err: &InterfaceError) -> Self {
        if err.is_resolution() {
            Self::AddressResolutionFailure {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            }
        } else {
            Self::InvalidParameterValue {
                key,
                value: value.to_string(),
                reason: err.to_string(),
            }
        }
    }
}

impl From<UriError> for ChannelError {
    fn from(e: UriError) -> Self {
        match e {
            UriError::TooLong { length, max } => Self::UriTooLong { length, max },
            UriError::DuplicateParam(key) => Self::DuplicateParameter { key },
            UriError::UnsupportedMedia(media) => Self::UnsupportedMedia { media },
            other @ (UriError::NotUtf8
            | UriError::InvalidScheme
            | UriError::MissingMedia
            | UriError::MalformedParam(_)) => Self::MalformedUri {
                reason: other.to_string(),
            },
        }
    }
}

impl From<ParamError> for ChannelError {
    fn from(e: ParamError) -> Self {
        match e {
            ParamError::Invalid { key, value, reason } => Self::InvalidParameterValue {
                key,
                value,
                reason: reason.to_string(),
            },
            ParamError::Conflict { first, second } => {
                Self::ConflictingParameters { first, second }
            }
            ParamError::Missing { key } => Self::MissingParameter { key },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn too_long_is_malformed() {
        let err = ChannelError::from(UriError::TooLong {
            length: 5000,
            max: 4096,
        });
        assert_eq!(err.kind(), ErrorKind::MalformedUri);
        assert_eq!(err.to_string(), "channel uri length 5000 exceeds maximum 4096");
    }

    #[test]
    fn address_errors_split_by_cause() {
        let syntax =
            ChannelError::address("endpoint", "x:y", &AddressError::InvalidPort("y".into()));
        assert_eq!(syntax.kind(), ErrorKind::InvalidParameterValue);

        let lookup = ChannelError::address(
            "endpoint",
            "nowhere:1",
            &AddressError::Unresolved {
                host: "nowhere".into(),
                reason: "not found".into(),
            },
        );
        assert_eq!(lookup.kind(), ErrorKind::AddressResolutionFailure);
        assert_eq!(
            lookup.to_string(),
            "could not resolve endpoint=`nowhere:1`: could not resolve host `nowhere`: not found"
        );
    }

    #[test]
    fn param_errors_keep_keys() {
        let err = ChannelError::from(ParamError::Conflict {
            first: "control",
            second: "control-mode",
        });
        assert_eq!(
            err,
            ChannelError::ConflictingParameters {
                first: "control",
                second: "control-mode"
            }
        );
    }
}
