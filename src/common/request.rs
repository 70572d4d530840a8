use crate::common::header::{CONNECTION, HeaderMap, HeaderMapOps};
use crate::common::method::Method;
use crate::common::version::Version;

/// An HTTP request as read off the wire.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Request {
    /// The method.
    pub method: Method,
    /// The URI from the request line, including any query string.
    pub uri: String,
    /// The HTTP version.
    pub version: Version,
    /// The headers.
    pub headers: HeaderMap,
    /// The raw body.
    pub body: Vec<u8>,
}

impl Request {
    /// Creates an HTTP/1.1 request without headers or body.
    pub fn new(method: Method, uri: impl Into<String>) -> Request {
        Request { method, uri: uri.into(), version: Version::Http11, headers: HeaderMap::new(), body: vec![] }
    }

    /// The URI without the query string.
    pub fn path(&self) -> &str {
        self.uri.split_once('?').map_or(self.uri.as_str(), |(path, _)| path)
    }

    /// The query string, if the URI has one.
    pub fn query(&self) -> Option<&str> {
        self.uri.split_once('?').map(|(_, query)| query)
    }

    /// Checks if the connection should be closed once this request is answered.
    pub fn closes_connection(&self) -> bool {
        if self.headers.contains_token(&CONNECTION, "close") {
            return true;
        }
        !self.version.keeps_alive_by_default() && !self.headers.contains_token(&CONNECTION, "keep-alive")
    }
}
