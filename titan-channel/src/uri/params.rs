//! UDP channel parameter validation.
//!
//! Runs before any address is resolved so a malformed request never costs a
//! name lookup or an interface scan.
//!
//! | Combination                              | Outcome                 |
//! |------------------------------------------|-------------------------|
//! | `control` + `control-mode=manual`        | conflict                |
//! | `control` + `interface`                  | conflict                |
//! | `control-mode=dynamic` without `control` | missing `control`       |
//! | tag reference + `interface` or `ttl`     | conflict                |
//! | no `endpoint`, `control`, manual or tags | missing `endpoint`      |

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::parser::UriParams;

pub const ENDPOINT: &str = "endpoint";
pub const INTERFACE: &str = "interface";
pub const CONTROL: &str = "control";
pub const CONTROL_MODE: &str = "control-mode";
pub const TTL: &str = "ttl";
pub const TAGS: &str = "tags";

pub const CONTROL_MODE_MANUAL: &str = "manual";
pub const CONTROL_MODE_DYNAMIC: &str = "dynamic";
/// Alternate spelling of `dynamic`; parsed as [`ControlMode::Dynamic`].
pub const CONTROL_MODE_DYNAMIC_ALIAS: &str = "dynaimc";

/// Errors found while checking parameters.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    /// A value failed type or range validation.
    #[error("invalid value `{value}` for `{key}`: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
    /// Two parameters that cannot be combined.
    #[error("`{first}` cannot be combined with `{second}`")]
    Conflict {
        first: &'static str,
        second: &'static str,
    },
    /// A parameter required by the others is absent.
    #[error("missing required parameter `{key}`")]
    Missing { key: &'static str },
}

/// How a channel's control address is established.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlMode {
    /// No `control-mode` parameter.
    #[default]
    None,
    /// Destinations are added explicitly by the publisher.
    Manual,
    /// Receivers register through the publisher's control address.
    Dynamic,
}

impl ControlMode {
    /// Token used in canonical forms.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Manual => CONTROL_MODE_MANUAL,
            Self::Dynamic => CONTROL_MODE_DYNAMIC,
        }
    }
}

impl fmt::Display for ControlMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Channel tag: a numeric alias later URIs can use instead of the full
/// parameter set. Always non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChannelTag(i64);

impl ChannelTag {
    /// Raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl TryFrom<i64> for ChannelTag {
    type Error = i64;

    fn try_from(v: i64) -> Result<Self, Self::Error> {
        if v < 0 { Err(v) } else { Ok(Self(v)) }
    }
}

impl FromStr for ChannelTag {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(());
        }
        s.parse::<i64>().map(Self).map_err(|_| ())
    }
}

impl fmt::Display for ChannelTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Parsed `tags=<channel>[,<pub-sub>]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tags {
    pub channel: ChannelTag,
    pub pub_sub: Option<ChannelTag>,
}

impl FromStr for Tags {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split(',');
        let channel = parts.next().ok_or(())?.parse()?;
        let pub_sub = parts.next().map(str::parse).transpose()?;
        if parts.next().is_some() {
            return Err(());
        }
        Ok(Self { channel, pub_sub })
    }
}

/// The UDP parameters this crate interprets, checked and typed.
///
/// Address strings are kept as text; resolving them is the next stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelParams<'a> {
    pub endpoint: Option<&'a str>,
    pub interface: Option<&'a str>,
    pub control: Option<&'a str>,
    pub control_mode: ControlMode,
    pub ttl: Option<u8>,
    pub tags: Option<Tags>,
}

impl ChannelParams<'_> {
    /// True if the URI only points at an already tagged channel.
    #[must_use]
    pub const fn is_tag_reference(&self) -> bool {
        self.tags.is_some()
            && self.endpoint.is_none()
            && self.control.is_none()
            && matches!(self.control_mode, ControlMode::None)
    }
}

/// Checks value syntax and parameter combinations.
///
/// # Errors
///
/// Returns the first invalid value, conflicting pair or missing parameter.
pub fn validate(params: &UriParams) -> Result<ChannelParams<'_>, ParamError> {
    let control_mode = match params.get(CONTROL_MODE) {
        None => ControlMode::None,
        Some(CONTROL_MODE_MANUAL) => ControlMode::Manual,
        Some(CONTROL_MODE_DYNAMIC | CONTROL_MODE_DYNAMIC_ALIAS) => ControlMode::Dynamic,
        Some(other) => {
            return Err(ParamError::Invalid {
                key: CONTROL_MODE,
                value: other.to_string(),
                reason: "expected `manual` or `dynamic`",
            });
        }
    };

    let ttl = params
        .get(TTL)
        .map(|v| {
            parse_digits::<u8>(v).ok_or_else(|| ParamError::Invalid {
                key: TTL,
                value: v.to_string(),
                reason: "expected an integer in 0..=255",
            })
        })
        .transpose()?;

    let tags = params
        .get(TAGS)
        .map(|v| {
            v.parse::<Tags>().map_err(|()| ParamError::Invalid {
                key: TAGS,
                value: v.to_string(),
                reason: "expected `<channel-tag>[,<pub-sub-tag>]` of non-negative integers",
            })
        })
        .transpose()?;

    let endpoint = non_empty(params, ENDPOINT)?;
    let interface = non_empty(params, INTERFACE)?;
    let control = non_empty(params, CONTROL)?;

    let checked = ChannelParams {
        endpoint,
        interface,
        control,
        control_mode,
        ttl,
        tags,
    };
    check_combinations(&checked)?;
    Ok(checked)
}

fn check_combinations(p: &ChannelParams<'_>) -> Result<(), ParamError> {
    if p.control.is_some() {
        if p.control_mode == ControlMode::Manual {
            return Err(ParamError::Conflict {
                first: CONTROL,
                second: CONTROL_MODE,
            });
        }
        if p.interface.is_some() {
            return Err(ParamError::Conflict {
                first: CONTROL,
                second: INTERFACE,
            });
        }
    } else if p.control_mode == ControlMode::Dynamic {
        return Err(ParamError::Missing { key: CONTROL });
    }

    if p.is_tag_reference() {
        if p.interface.is_some() {
            return Err(ParamError::Conflict {
                first: TAGS,
                second: INTERFACE,
            });
        }
        if p.ttl.is_some() {
            return Err(ParamError::Conflict {
                first: TAGS,
                second: TTL,
            });
        }
        return Ok(());
    }

    if p.endpoint.is_none() && p.control.is_none() && p.control_mode != ControlMode::Manual {
        return Err(ParamError::Missing { key: ENDPOINT });
    }
    Ok(())
}

fn non_empty<'a>(params: &'a UriParams, key: &'static str) -> Result<Option<&'a str>, ParamError> {
    match params.get(key) {
        Some("") => Err(ParamError::Invalid {
            key,
            value: String::new(),
            reason: "value is empty",
        }),
        other => Ok(other),
    }
}

/// Plain decimal digits only; no sign, no whitespace.
fn parse_digits<T: FromStr>(v: &str) -> Option<T> {
    if v.is_empty() || !v.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    v.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::uri::parser::ChannelUri;

    fn check(uri: &str) -> Result<ControlMode, ParamError> {
        let uri = ChannelUri::parse(uri.as_bytes(), 4096).unwrap();
        validate(uri.params()).map(|p| p.control_mode)
    }

    fn params(uri: &str) -> ChannelUri {
        ChannelUri::parse(uri.as_bytes(), 4096).unwrap()
    }

    #[test]
    fn control_modes() {
        assert_eq!(check("aeron:udp?endpoint=a:1"), Ok(ControlMode::None));
        assert_eq!(
            check("aeron:udp?control-mode=manual"),
            Ok(ControlMode::Manual)
        );
        assert_eq!(
            check("aeron:udp?control=a:1|control-mode=dynamic"),
            Ok(ControlMode::Dynamic)
        );
        assert_eq!(
            check("aeron:udp?control=a:1|control-mode=dynaimc"),
            Ok(ControlMode::Dynamic)
        );
        assert_eq!(ControlMode::Dynamic.as_str(), "dynamic");
        for bad in ["Manual", "Dynamic", "dynamc", "", "auto"] {
            let err = check(&format!("aeron:udp?endpoint=a:1|control-mode={bad}")).unwrap_err();
            assert!(matches!(err, ParamError::Invalid { key: CONTROL_MODE, .. }));
        }
    }

    #[test]
    fn ttl_range() {
        let uri = params("aeron:udp?endpoint=a:1|ttl=255");
        assert_eq!(validate(uri.params()).unwrap().ttl, Some(255));
        let uri = params("aeron:udp?endpoint=a:1|ttl=0");
        assert_eq!(validate(uri.params()).unwrap().ttl, Some(0));
        for bad in ["256", "-1", "+1", "", "x", "1.5"] {
            let err = check(&format!("aeron:udp?endpoint=a:1|ttl={bad}")).unwrap_err();
            assert!(matches!(err, ParamError::Invalid { key: TTL, .. }), "{bad}");
        }
    }

    #[test]
    fn tags_syntax() {
        let uri = params("aeron:udp?endpoint=a:1|tags=1001,7");
        let tags = validate(uri.params()).unwrap().tags.unwrap();
        assert_eq!(tags.channel.as_i64(), 1001);
        assert_eq!(tags.pub_sub.map(ChannelTag::as_i64), Some(7));

        for bad in ["", "x", "-3", "1,2,3", "1,", "99999999999999999999"] {
            let err = check(&format!("aeron:udp?endpoint=a:1|tags={bad}")).unwrap_err();
            assert!(matches!(err, ParamError::Invalid { key: TAGS, .. }), "{bad}");
        }
    }

    #[test]
    fn control_conflicts() {
        assert_eq!(
            check("aeron:udp?control=a:1|control-mode=manual"),
            Err(ParamError::Conflict {
                first: CONTROL,
                second: CONTROL_MODE
            })
        );
        assert_eq!(
            check("aeron:udp?control=a:1|interface=b"),
            Err(ParamError::Conflict {
                first: CONTROL,
                second: INTERFACE
            })
        );
        assert_eq!(
            check("aeron:udp?endpoint=a:1|control-mode=dynamic"),
            Err(ParamError::Missing { key: CONTROL })
        );
    }

    #[test]
    fn tag_references() {
        let uri = params("aeron:udp?tags=5");
        assert!(validate(uri.params()).unwrap().is_tag_reference());

        let uri = params("aeron:udp?tags=5|endpoint=a:1");
        assert!(!validate(uri.params()).unwrap().is_tag_reference());

        assert_eq!(
            check("aeron:udp?tags=5|interface=eth0"),
            Err(ParamError::Conflict {
                first: TAGS,
                second: INTERFACE
            })
        );
        assert_eq!(
            check("aeron:udp?tags=5|ttl=3"),
            Err(ParamError::Conflict {
                first: TAGS,
                second: TTL
            })
        );
    }

    #[test]
    fn something_must_define_the_channel() {
        assert_eq!(
            check("aeron:udp"),
            Err(ParamError::Missing { key: ENDPOINT })
        );
        assert_eq!(
            check("aeron:udp?interface=eth0"),
            Err(ParamError::Missing { key: ENDPOINT })
        );
        assert!(check("aeron:udp?control=a:1").is_ok());
        assert!(check("aeron:udp?control-mode=manual|interface=eth0").is_ok());
    }

    #[test]
    fn empty_addresses_rejected() {
        assert!(matches!(
            check("aeron:udp?endpoint="),
            Err(ParamError::Invalid { key: ENDPOINT, .. })
        ));
    }
}
