use std::collections::HashMap;
use std::fmt::{Display, Formatter};

use crate::common::header::Header::{Custom, Standard};

/// A header name. Either a "Standard" header backed by a static string, or a "Custom" header with an owned,
/// lower-cased String. Standard headers avoid allocating for names the front door looks at on every request.
#[derive(PartialEq, Eq, Hash, Debug, Clone, PartialOrd, Ord)]
pub enum Header {
    Standard(&'static str),
    Custom(String),
}

impl Header {
    pub fn as_str(&self) -> &str {
        match self {
            Standard(str) => str,
            Custom(str) => str.as_str()
        }
    }

    /// Checks if values of this header carry credentials and should be kept out of logs.
    pub fn is_credential(&self) -> bool {
        [AUTHORIZATION, PROXY_AUTHORIZATION, COOKIE, SET_COOKIE].contains(self)
    }
}

impl Display for Header {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

macro_rules! standard_headers {
    (
        $(
            $(#[$docs:meta])*
            ($name:ident, $value:expr);
        )+
    ) => {
        $(
            $(#[$docs])*
            pub const $name: Header = Header::Standard($value);
        )+

        impl From<String> for Header {
            /// Gets a header from the given header name. Names are case-insensitive.
            fn from(mut value: String) -> Header {
                value.make_ascii_lowercase();
                match value.as_str() {
                    $(
                    $value => $name,
                    )+
                    _ => Header::Custom(value)
                }
            }
        }
    }
}

impl From<&str> for Header {
    fn from(value: &str) -> Header {
        Header::from(value.to_string())
    }
}

standard_headers! {
    (ACCEPT, "accept");
    (ACCESS_CONTROL_ALLOW_CREDENTIALS, "access-control-allow-credentials");
    (ACCESS_CONTROL_ALLOW_HEADERS, "access-control-allow-headers");
    (ACCESS_CONTROL_ALLOW_METHODS, "access-control-allow-methods");
    (ACCESS_CONTROL_ALLOW_ORIGIN, "access-control-allow-origin");
    (ACCESS_CONTROL_REQUEST_HEADERS, "access-control-request-headers");
    (ACCESS_CONTROL_REQUEST_METHOD, "access-control-request-method");
    (AUTHORIZATION, "authorization");
    (CONNECTION, "connection");
    (CONTENT_LENGTH, "content-length");
    (CONTENT_TYPE, "content-type");
    (COOKIE, "cookie");
    (HOST, "host");
    (ORIGIN, "origin");
    (PROXY_AUTHORIZATION, "proxy-authorization");
    (SET_COOKIE, "set-cookie");
    (TRANSFER_ENCODING, "transfer-encoding");
    (USER_AGENT, "user-agent");
    (VARY, "vary");
}

/// Creates a map of headers.
/// ```
/// use frontdoor::common::header::{CONTENT_TYPE, ORIGIN, Header, HeaderMapOps};
/// use frontdoor::header_map;
///
/// let headers = header_map![
///    (ORIGIN, "http://localhost:5173"),
///    ("coNtEnt-TyPE", "application/json"),
///    ("x-request-id", "42"),
/// ];
///
/// assert!(headers.contains_header_value(&ORIGIN, "http://localhost:5173"));
/// assert!(headers.contains_header_value(&CONTENT_TYPE, "application/json"));
/// assert!(headers.contains_header_value(&Header::Custom("x-request-id".into()), "42"));
/// ```
#[macro_export]
macro_rules! header_map {
    () => { $crate::common::header::HeaderMap::new() };
    ($(($header:expr, $value:expr)),+ $(,)?) => {
        <$crate::common::header::HeaderMap as $crate::common::header::HeaderMapOps>::from_pairs(vec![
            $(($header.into(), $value.into()),)+
        ])
    }
}

/// Operations for a header map.
pub trait HeaderMapOps {
    /// Gets a header map from the given vector of header value and key pairs.
    fn from_pairs(header_values: Vec<(Header, String)>) -> Self;
    /// Adds a value for the header, keeping values already present.
    fn add_header(&mut self, k: Header, v: String);
    /// Replaces every value of the header with the given one.
    fn set_header(&mut self, k: Header, v: String);
    /// Checks if the map contains the given header and corresponding header value.
    fn contains_header_value(&self, k: &Header, v: &str) -> bool;
    /// Checks if any comma separated element of the header's values equals the token, ignoring ASCII case.
    /// `connection: keep-alive, Close` contains the token "close".
    fn contains_token(&self, k: &Header, token: &str) -> bool;
    /// Gets the first value for the given header.
    fn get_first_header_value(&self, k: &Header) -> Option<&String>;
}

/// A multimap of headers to values.
pub type HeaderMap = HashMap<Header, Vec<String>>;

impl HeaderMapOps for HeaderMap {
    fn from_pairs(header_values: Vec<(Header, String)>) -> HeaderMap {
        header_values.into_iter().fold(HashMap::new(), |mut m, (header, value)| {
            m.add_header(header, value);
            m
        })
    }

    fn add_header(&mut self, k: Header, v: String) {
        self.entry(k).or_default().push(v)
    }

    fn set_header(&mut self, k: Header, v: String) {
        self.insert(k, vec![v]);
    }

    fn contains_header_value(&self, k: &Header, v: &str) -> bool {
        self.get(k).map_or(false, |values| values.iter().any(|value| value == v))
    }

    fn contains_token(&self, k: &Header, token: &str) -> bool {
        self.get(k).map_or(false, |values| {
            values.iter()
                .flat_map(|value| value.split(','))
                .any(|element| element.trim().eq_ignore_ascii_case(token))
        })
    }

    fn get_first_header_value(&self, k: &Header) -> Option<&String> {
        self.get(k)?.first()
    }
}
