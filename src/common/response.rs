use serde_json::Value;

use crate::common::header::{CONTENT_TYPE, Header, HeaderMap, HeaderMapOps};
use crate::common::status;
use crate::common::status::Status;
use crate::header_map;

/// An HTTP response. `content-length` is derived from the body when the response is written.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Response {
    /// The status.
    pub status: Status,
    /// The headers.
    pub headers: HeaderMap,
    /// The body.
    pub body: Vec<u8>,
}

impl Response {
    /// Creates a response with a JSON body.
    pub fn json(status: Status, value: &Value) -> Response {
        Response {
            status,
            headers: header_map![(CONTENT_TYPE, "application/json; charset=utf-8")],
            body: value.to_string().into_bytes(),
        }
    }

    /// Creates a response with an HTML body, the way unmatched routes are answered.
    pub fn html(status: Status, body: impl Into<String>) -> Response {
        Response {
            status,
            headers: header_map![(CONTENT_TYPE, "text/html; charset=utf-8")],
            body: body.into().into_bytes(),
        }
    }

    /// Adds a header value and returns the response.
    pub fn with_header(mut self, header: Header, value: impl Into<String>) -> Response {
        self.headers.add_header(header, value.into());
        self
    }
}

impl From<Status> for Response {
    /// Creates an empty response with the given status.
    fn from(status: Status) -> Self {
        Response {
            status,
            headers: header_map![],
            body: vec![],
        }
    }
}

impl From<String> for Response {
    /// Creates a response with the given string as its body.
    fn from(body: String) -> Self {
        body.into_bytes().into()
    }
}

impl From<&str> for Response {
    /// Creates a response with the given string as its body.
    fn from(body: &str) -> Self {
        body.to_string().into()
    }
}

impl From<Vec<u8>> for Response {
    /// Creates a response with the given bytes as its body.
    fn from(body: Vec<u8>) -> Self {
        Response {
            status: status::OK,
            headers: header_map![],
            body,
        }
    }
}
