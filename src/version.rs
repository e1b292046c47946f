//! Version model: `MAJOR.MINOR` final releases and `MAJOR.MINORsSERIAL`
//! in-development releases (s = a | b | rc).

use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum VersionError {
    #[error("invalid version string: {0}")]
    Invalid(String),
}

/// Development stage of an in-dev release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Alpha,
    Beta,
    ReleaseCandidate,
}

impl Stage {
    fn parse(s: &str) -> Option<Stage> {
        match s {
            "a" => Some(Stage::Alpha),
            "b" => Some(Stage::Beta),
            "rc" => Some(Stage::ReleaseCandidate),
            _ => None,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Stage::Alpha => "a",
            Stage::Beta => "b",
            Stage::ReleaseCandidate => "rc",
        }
    }
}

/// A project version.
///
/// The stage is `None` for a final release; a final release carries neither
/// a stage letter nor a serial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Version {
    pub major: u32,
    pub minor: u32,
    pub stage: Option<Stage>,
    pub serial: u32,
}

fn indev_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<major>\d+)\.(?P<minor>\d+)(?P<stage>a|b|rc)(?P<serial>\d+)$")
            .expect("valid indev version pattern")
    })
}

fn final_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"^(?P<major>\d+)\.(?P<minor>\d+)$").expect("valid final version pattern")
    })
}

impl Version {
    /// A final release.
    pub const fn release(major: u32, minor: u32) -> Version {
        Version {
            major,
            minor,
            stage: None,
            serial: 0,
        }
    }

    pub const fn is_final(&self) -> bool {
        self.stage.is_none()
    }
}

impl FromStr for Version {
    type Err = VersionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || VersionError::Invalid(s.to_string());

        if let Some(caps) = indev_pattern().captures(s) {
            let stage = Stage::parse(&caps["stage"]).ok_or_else(invalid)?;
            return Ok(Version {
                major: caps["major"].parse().map_err(|_| invalid())?,
                minor: caps["minor"].parse().map_err(|_| invalid())?,
                stage: Some(stage),
                serial: caps["serial"].parse().map_err(|_| invalid())?,
            });
        }

        // A final version carries no stage letter and no third component;
        // the anchored pattern rejects both.
        let caps = final_pattern().captures(s).ok_or_else(invalid)?;
        Ok(Version::release(
            caps["major"].parse().map_err(|_| invalid())?,
            caps["minor"].parse().map_err(|_| invalid())?,
        ))
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.stage {
            Some(stage) => write!(
                f,
                "{}.{}{}{}",
                self.major,
                self.minor,
                stage.as_str(),
                self.serial
            ),
            None => write!(f, "{}.{}", self.major, self.minor),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_indev_and_final_forms() {
        assert_eq!(
            "0.0a0".parse::<Version>().unwrap(),
            Version {
                major: 0,
                minor: 0,
                stage: Some(Stage::Alpha),
                serial: 0
            }
        );
        assert_eq!("1.2".parse::<Version>().unwrap(), Version::release(1, 2));
    }

    #[test]
    fn rejects_stage_without_serial_and_extra_components() {
        assert!("3.3a".parse::<Version>().is_err());
        assert!("3.3.3".parse::<Version>().is_err());
    }
}
