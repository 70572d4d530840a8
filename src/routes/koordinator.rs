use crate::common::method::Method;
use crate::router::{PatternError, Router};
use crate::routes::placeholders;

const ROUTES: [(Method, &str); 5] = [
    (Method::GET, "/koordinator"),
    (Method::POST, "/koordinator"),
    (Method::GET, "/koordinator/:id"),
    (Method::PUT, "/koordinator/:id"),
    (Method::DELETE, "/koordinator/:id"),
];

pub fn routes() -> Result<Router, PatternError> {
    placeholders("koordinator", &ROUTES)
}
