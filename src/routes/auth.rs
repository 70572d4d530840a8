use crate::common::method::Method;
use crate::router::{PatternError, Router};
use crate::routes::placeholders;

const ROUTES: [(Method, &str); 5] = [
    (Method::GET, "/login"),
    (Method::POST, "/login"),
    (Method::POST, "/logout"),
    (Method::POST, "/register"),
    (Method::GET, "/me"),
];

pub fn routes() -> Result<Router, PatternError> {
    placeholders("auth", &ROUTES)
}
