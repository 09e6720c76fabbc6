//! Channel URI tokenizer.
//!
//! Pure text processing: no parameter is interpreted here beyond checking
//! that keys are unique.

use std::fmt;

use thiserror::Error;

/// URI scheme prefix, including the separating colon.
pub const SCHEME_PREFIX: &str = "aeron:";

/// Separator between the media and the parameters.
pub const PARAMS_START: char = '?';

/// Separator between parameters.
pub const PARAM_SEPARATOR: char = '|';

/// Separator between a key and its value.
pub const KEY_VALUE_SEPARATOR: char = '=';

/// Errors splitting a channel URI.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    /// Input exceeds the configured maximum length.
    #[error("uri length {length} exceeds maximum {max}")]
    TooLong { length: usize, max: usize },
    /// Input bytes are not UTF-8.
    #[error("uri is not valid UTF-8")]
    NotUtf8,
    /// The `aeron:` prefix is missing.
    #[error("uri must start with `aeron:`")]
    InvalidScheme,
    /// Nothing between the scheme and `?`.
    #[error("uri has no media type")]
    MissingMedia,
    /// A parameter segment is not `key=value`.
    #[error("malformed parameter `{0}`")]
    MalformedParam(String),
    /// A key appears twice.
    #[error("duplicate parameter `{0}`")]
    DuplicateParam(String),
    /// The media type is not one the transport knows.
    #[error("unsupported media `{0}`")]
    UnsupportedMedia(String),
}

/// Media types the transport recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Media {
    Udp,
    Ipc,
}

impl Media {
    /// The media token as written in a URI.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Udp => "udp",
            Self::Ipc => "ipc",
        }
    }

    fn from_token(token: &str) -> Option<Self> {
        match token {
            "udp" => Some(Self::Udp),
            "ipc" => Some(Self::Ipc),
            _ => None,
        }
    }
}

impl fmt::Display for Media {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parameters in the order they were written. Keys are unique.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UriParams {
    entries: Vec<(String, String)>,
}

impl UriParams {
    /// Value of `key`, if present.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True if `key` is present.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Iterates `(key, value)` in written order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert(&mut self, key: &str, value: &str) -> Result<(), UriError> {
        if self.contains(key) {
            return Err(UriError::DuplicateParam(key.to_string()));
        }
        self.entries.push((key.to_string(), value.to_string()));
        Ok(())
    }
}

/// A tokenized channel URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelUri {
    media: Media,
    params: UriParams,
}

impl ChannelUri {
    /// Splits `uri` into media and parameters.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is longer than `max_length`, is not
    /// UTF-8, lacks the scheme or media, has a malformed or repeated
    /// parameter, or names an unknown media.
    pub fn parse(uri: &[u8], max_length: usize) -> Result<Self, UriError> {
        if uri.len() > max_length {
            return Err(UriError::TooLong {
                length: uri.len(),
                max: max_length,
            });
        }
        let text = std::str::from_utf8(uri).map_err(|_| UriError::NotUtf8)?;
        let rest = text
            .strip_prefix(SCHEME_PREFIX)
            .ok_or(UriError::InvalidScheme)?;

        let (media, query) = match rest.split_once(PARAMS_START) {
            Some((media, query)) => (media, Some(query)),
            None => (rest, None),
        };
        if media.is_empty() {
            return Err(UriError::MissingMedia);
        }
        let media =
            Media::from_token(media).ok_or_else(|| UriError::UnsupportedMedia(media.to_string()))?;

        let mut params = UriParams::default();
        if let Some(query) = query.filter(|q| !q.is_empty()) {
            for segment in query.split(PARAM_SEPARATOR) {
                let (key, value) = segment
                    .split_once(KEY_VALUE_SEPARATOR)
                    .filter(|(key, _)| !key.is_empty())
                    .ok_or_else(|| UriError::MalformedParam(segment.to_string()))?;
                params.insert(key, value)?;
            }
        }

        Ok(Self { media, params })
    }

    /// The media type.
    #[must_use]
    pub const fn media(&self) -> Media {
        self.media
    }

    /// The parameters.
    #[must_use]
    pub const fn params(&self) -> &UriParams {
        &self.params
    }
}

/// Renders `aeron:<media>?k=v|...` in the original parameter order.
impl fmt::Display for ChannelUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{SCHEME_PREFIX}{}", self.media)?;
        for (i, (key, value)) in self.params.iter().enumerate() {
            let sep = if i == 0 { PARAMS_START } else { PARAM_SEPARATOR };
            write!(f, "{sep}{key}{KEY_VALUE_SEPARATOR}{value}")?;
        }
        Ok(())
    }
}
