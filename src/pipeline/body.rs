use serde_json::Value;
use thiserror::Error;

use crate::common::header::{CONTENT_TYPE, HeaderMapOps};
use crate::common::request::Request;
use crate::common::status;
use crate::common::status::Status;
use crate::pipeline::{Exchange, form, Outcome, Stage};

/// A request body after the body parsing stage.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// No payload, or a content type no parser handles.
    Empty,
    /// A JSON document.
    Json(Value),
    /// An URL-encoded form, expanded into nested objects and arrays of strings.
    Form(Value),
    /// A payload a parser handled but rejected.
    Malformed(BodyError),
}

impl Body {
    /// The parsed body as a JSON value. Bodies without a parsed value give an empty object.
    pub fn to_value(&self) -> Value {
        match self {
            Body::Json(value) | Body::Form(value) => value.clone(),
            Body::Empty | Body::Malformed(_) => Value::Object(Default::default()),
        }
    }
}

/// Reasons a payload is rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BodyError {
    #[error("invalid json: {0}")]
    Json(String),
    #[error("unsupported charset \"{0}\"")]
    UnsupportedCharset(String),
    #[error("request entity too large")]
    TooLarge,
    #[error("too many parameters")]
    TooManyParameters,
    #[error("body is not valid utf-8")]
    InvalidUtf8,
}

impl BodyError {
    /// The status a request with this body is answered with.
    pub fn status(&self) -> Status {
        match self {
            BodyError::Json(_) | BodyError::InvalidUtf8 => status::BAD_REQUEST,
            BodyError::UnsupportedCharset(_) => status::UNSUPPORTED_MEDIA_TYPE,
            BodyError::TooLarge | BodyError::TooManyParameters => status::PAYLOAD_TOO_LARGE,
        }
    }
}

/// Limits applied while parsing bodies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BodyLimits {
    /// Largest payload parsed, in bytes.
    pub max_bytes: usize,
    /// Most pairs accepted in an URL-encoded body.
    pub max_parameters: usize,
    /// Most bracket segments expanded in one form key.
    pub max_depth: usize,
    /// Highest form index treated as an array position.
    pub array_limit: usize,
}

impl Default for BodyLimits {
    fn default() -> Self {
        BodyLimits { max_bytes: 100 * 1024, max_parameters: 1000, max_depth: 5, array_limit: 20 }
    }
}

/// A media type with its charset parameter, if any. Both lower-cased.
#[derive(Debug, PartialEq, Eq)]
struct MediaType {
    essence: String,
    charset: Option<String>,
}

impl MediaType {
    fn parse(raw: &str) -> MediaType {
        let mut parts = raw.split(';');
        let essence = parts.next().unwrap_or_default().trim().to_ascii_lowercase();
        let charset = parts
            .filter_map(|param| param.split_once('='))
            .find(|(name, _)| name.trim().eq_ignore_ascii_case("charset"))
            .map(|(_, value)| value.trim().trim_matches('"').to_ascii_lowercase());
        MediaType { essence, charset }
    }

    fn is_json(&self) -> bool {
        if self.essence == "application/json" {
            return true;
        }
        // any type/subtype+json structured syntax
        match self.essence.split_once('/') {
            Some((kind, subtype)) => !kind.is_empty() && subtype.len() > "+json".len() && subtype.ends_with("+json"),
            None => false,
        }
    }

    fn is_form(&self) -> bool {
        self.essence == "application/x-www-form-urlencoded"
    }

    fn check_charset(&self) -> Result<(), BodyError> {
        match &self.charset {
            Some(charset) if charset != "utf-8" => Err(BodyError::UnsupportedCharset(charset.clone())),
            _ => Ok(()),
        }
    }
}

/// Parses JSON and URL-encoded bodies into [Body] values.
pub struct BodyParser {
    limits: BodyLimits,
}

impl BodyParser {
    pub fn new(limits: BodyLimits) -> BodyParser {
        BodyParser { limits }
    }

    /// Parses the body of the request based on its content type.
    pub fn parse(&self, request: &Request) -> Body {
        if request.body.is_empty() {
            return Body::Empty;
        }
        let media_type = match request.headers.get_first_header_value(&CONTENT_TYPE) {
            Some(raw) => MediaType::parse(raw),
            None => return Body::Empty,
        };

        let parsed = if media_type.is_json() {
            self.check(&media_type, &request.body).and_then(|_| parse_json(&request.body)).map(Body::Json)
        } else if media_type.is_form() {
            self.check(&media_type, &request.body).and_then(|_| form::parse(&request.body, &self.limits)).map(Body::Form)
        } else {
            return Body::Empty;
        };

        parsed.unwrap_or_else(Body::Malformed)
    }

    fn check(&self, media_type: &MediaType, body: &[u8]) -> Result<(), BodyError> {
        media_type.check_charset()?;
        if body.len() > self.limits.max_bytes {
            return Err(BodyError::TooLarge);
        }
        std::str::from_utf8(body).map_err(|_| BodyError::InvalidUtf8)?;
        Ok(())
    }
}

/// Only objects and arrays are accepted at the top level.
fn parse_json(body: &[u8]) -> Result<Value, BodyError> {
    match body.iter().find(|b| !b.is_ascii_whitespace()) {
        Some(b'{') | Some(b'[') => {}
        Some(_) => return Err(BodyError::Json("top level value must be an object or array".to_string())),
        None => return Err(BodyError::Json("empty document".to_string())),
    }
    serde_json::from_slice(body).map_err(|err| BodyError::Json(err.to_string()))
}

impl Stage for BodyParser {
    fn apply(&self, exchange: &mut Exchange) -> Outcome {
        exchange.body = self.parse(&exchange.request);
        Outcome::Next
    }
}

/// Answers requests whose body was rejected by the body parser, so they never reach a route.
pub struct RejectMalformed;

impl Stage for RejectMalformed {
    fn apply(&self, exchange: &mut Exchange) -> Outcome {
        match &exchange.body {
            Body::Malformed(err) => Outcome::Respond(err.status().into()),
            _ => Outcome::Next,
        }
    }
}
