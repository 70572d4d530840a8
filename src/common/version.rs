use std::fmt::{Display, Formatter};

/// HTTP version "HTTP/1.0"
pub const HTTP_VERSION_1_0: &str = "HTTP/1.0";
/// HTTP version "HTTP/1.1"
pub const HTTP_VERSION_1_1: &str = "HTTP/1.1";

/// A supported HTTP version.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Version {
    Http10,
    Http11,
}

impl Version {
    /// Gets the version from the raw version string. Returns None if the version is not supported.
    pub fn parse(raw: &str) -> Option<Version> {
        match raw {
            HTTP_VERSION_1_0 => Some(Version::Http10),
            HTTP_VERSION_1_1 => Some(Version::Http11),
            _ => None
        }
    }

    /// Whether connections stay open after a response unless the client asks otherwise.
    pub fn keeps_alive_by_default(&self) -> bool {
        *self == Version::Http11
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Version::Http10 => HTTP_VERSION_1_0,
            Version::Http11 => HTTP_VERSION_1_1,
        })
    }
}
