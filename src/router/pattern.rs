use regex::Regex;
use serde_json::{Map, Value};
use thiserror::Error;

/// A problem with a route pattern, found when the route is registered.
#[derive(Error, Debug)]
pub enum PatternError {
    #[error("pattern \"{0}\" does not start with '/'")]
    NotAbsolute(String),
    #[error("pattern \"{0}\" has a parameter without a valid name")]
    InvalidParameter(String),
    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A route pattern such as `/mahasiswa/:id`. Literal segments match case-insensitively, `:name` segments match
/// one non-empty path segment, and a trailing slash on the path is ignored.
#[derive(Debug)]
pub struct Pattern {
    source: String,
    names: Vec<String>,
    regex: Regex,
}

impl Pattern {
    pub fn parse(source: &str) -> Result<Pattern, PatternError> {
        if !source.starts_with('/') {
            return Err(PatternError::NotAbsolute(source.to_string()));
        }

        let mut names = vec![];
        let mut regex = String::from("(?i)^");
        for segment in source.trim_end_matches('/').split('/').skip(1) {
            regex.push('/');
            match segment.strip_prefix(':') {
                Some(name) => {
                    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
                        return Err(PatternError::InvalidParameter(source.to_string()));
                    }
                    names.push(name.to_string());
                    regex.push_str("([^/]+)");
                }
                None => regex.push_str(&regex::escape(segment)),
            }
        }
        regex.push_str("/?$");

        Ok(Pattern { source: source.to_string(), names, regex: Regex::new(&regex)? })
    }

    /// The pattern as it was registered.
    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Matches the path against this pattern, capturing the parameters.
    pub fn captures(&self, path: &str) -> Option<Params> {
        let captures = self.regex.captures(path)?;
        let params = self.names.iter()
            .zip(captures.iter().skip(1))
            .filter_map(|(name, value)| Some((name.clone(), value?.as_str().to_string())))
            .collect();
        Some(Params(params))
    }
}

/// Parameters captured from a path, in pattern order. Values are exactly as they appear in the path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params(Vec<(String, String)>);

impl Params {
    /// Gets the value captured for the named parameter.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.iter().find(|(param, _)| param == name).map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_json(&self) -> Value {
        Value::Object(self.0.iter()
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect::<Map<String, Value>>())
    }
}
