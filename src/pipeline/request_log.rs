use log::info;
use regex::Regex;
use serde_json::{Map, Value};

use crate::pipeline::{Exchange, Outcome, Stage};
use crate::pipeline::body::Body;

const REDACTED: &str = "[REDACTED]";

/// Body fields whose names contain one of these are redacted.
const SECRET_FIELDS: [&str; 3] = ["password", "secret", "token"];

/// Finds `name: value` or `name=value` pairs with a secret name in raw payload text. The value may be quoted and
/// cut off, or run up to the next '&' or whitespace.
const RAW_SECRET_PATTERN: &str = r#"(?i)((?:"[^"]*(?:FIELDS)[^"]*"|[\w\[\].-]*(?:FIELDS)[\w\[\].-]*)\s*[:=]\s*)(?:"(?:[^"\\]|\\.)*"?|[^&\s]*)"#;

/// Request logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    /// Replaces credential headers and secret body fields with a placeholder.
    pub redact_credentials: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig { redact_credentials: true }
    }
}

/// Logs the method, path, headers and parsed body of every request.
pub struct RequestLog {
    config: LogConfig,
    raw_secrets: Option<Regex>,
}

impl RequestLog {
    pub fn new(config: LogConfig) -> RequestLog {
        let raw_secrets = Regex::new(&RAW_SECRET_PATTERN.replace("FIELDS", &SECRET_FIELDS.join("|"))).ok();
        RequestLog { config, raw_secrets }
    }

    /// The three lines logged for the exchange.
    pub fn lines(&self, exchange: &Exchange) -> [String; 3] {
        let request = &exchange.request;
        [
            format!("{} {}", request.method, request.path()),
            format!("Headers: {}", self.headers(exchange)),
            format!("Body: {}", self.body(exchange)),
        ]
    }

    fn headers(&self, exchange: &Exchange) -> Value {
        let mut headers: Vec<_> = exchange.request.headers.iter().collect();
        headers.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
        let fields = headers.into_iter()
            .map(|(header, values)| {
                let value = if self.config.redact_credentials && header.is_credential() {
                    REDACTED.to_string()
                } else {
                    values.join(", ")
                };
                (header.to_string(), Value::String(value))
            })
            .collect::<Map<String, Value>>();
        Value::Object(fields)
    }

    fn body(&self, exchange: &Exchange) -> Value {
        match &exchange.body {
            Body::Malformed(_) => Value::String(self.raw_body(&exchange.request.body)),
            body => {
                let mut value = body.to_value();
                if self.config.redact_credentials {
                    redact_secrets(&mut value);
                }
                value
            }
        }
    }
}

impl RequestLog {
    /// The payload a parser rejected, as text. Secret values are scrubbed from it unless credentials are logged.
    fn raw_body(&self, body: &[u8]) -> String {
        let raw = String::from_utf8_lossy(body);
        if !self.config.redact_credentials {
            return raw.into_owned();
        }
        match &self.raw_secrets {
            Some(secrets) => secrets.replace_all(&raw, format!("${{1}}{}", REDACTED).as_str()).into_owned(),
            None => format!("{} ({} bytes)", REDACTED, body.len()),
        }
    }
}

fn is_secret(field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    SECRET_FIELDS.iter().any(|secret| field.contains(secret))
}

fn redact_secrets(value: &mut Value) {
    match value {
        Value::Object(fields) => {
            for (field, value) in fields.iter_mut() {
                if is_secret(field) {
                    *value = Value::String(REDACTED.to_string());
                } else {
                    redact_secrets(value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(redact_secrets),
        _ => {}
    }
}

impl Stage for RequestLog {
    fn apply(&self, exchange: &mut Exchange) -> Outcome {
        for line in self.lines(exchange) {
            info!("{}", line);
        }
        Outcome::Next
    }
}
