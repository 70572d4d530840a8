use crate::common::header::{ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_REQUEST_HEADERS, ACCESS_CONTROL_REQUEST_METHOD, HeaderMapOps, ORIGIN, VARY};
use crate::common::method::Method;
use crate::common::response::Response;
use crate::common::status;
use crate::pipeline::{Exchange, Outcome, Stage};

/// The browser origin allowed by default.
pub const DEFAULT_ORIGIN: &str = "http://localhost:5173";

/// Methods advertised to preflight requests.
const ALLOWED_METHODS: &str = "GET,HEAD,PUT,PATCH,POST,DELETE";

/// Cross-origin settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsConfig {
    /// The single origin allowed to make cross-origin requests. Compared exactly.
    pub origin: String,
    /// Whether browsers may send cookies and authorization headers along.
    pub credentials: bool,
}

impl Default for CorsConfig {
    fn default() -> Self {
        CorsConfig { origin: DEFAULT_ORIGIN.to_string(), credentials: true }
    }
}

/// Adds cross-origin headers to responses and answers preflight requests.
pub struct Cors {
    config: CorsConfig,
}

impl Cors {
    pub fn new(config: CorsConfig) -> Cors {
        Cors { config }
    }

    fn is_preflight(exchange: &Exchange) -> bool {
        exchange.request.method == Method::OPTIONS
            && exchange.request.headers.contains_key(&ACCESS_CONTROL_REQUEST_METHOD)
    }
}

impl Stage for Cors {
    fn apply(&self, exchange: &mut Exchange) -> Outcome {
        let allowed = match exchange.request.headers.get_first_header_value(&ORIGIN) {
            None => return Outcome::Next,
            Some(origin) => *origin == self.config.origin,
        };

        let headers = &mut exchange.response_headers;
        headers.add_header(VARY, "Origin".to_string());
        if allowed {
            headers.set_header(ACCESS_CONTROL_ALLOW_ORIGIN, self.config.origin.clone());
            if self.config.credentials {
                headers.set_header(ACCESS_CONTROL_ALLOW_CREDENTIALS, "true".to_string());
            }
        }

        if !Cors::is_preflight(exchange) {
            return Outcome::Next;
        }

        let mut response = Response::from(status::NO_CONTENT);
        if allowed {
            response.headers.set_header(ACCESS_CONTROL_ALLOW_METHODS, ALLOWED_METHODS.to_string());
            if let Some(requested) = exchange.request.headers.get(&ACCESS_CONTROL_REQUEST_HEADERS) {
                response.headers.set_header(ACCESS_CONTROL_ALLOW_HEADERS, requested.join(", "));
                exchange.response_headers.add_header(VARY, "Access-Control-Request-Headers".to_string());
            }
        }
        Outcome::Respond(response)
    }
}
