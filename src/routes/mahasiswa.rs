use crate::common::method::Method;
use crate::router::{PatternError, Router};
use crate::routes::placeholders;

const ROUTES: [(Method, &str); 5] = [
    (Method::GET, "/mahasiswa"),
    (Method::POST, "/mahasiswa"),
    (Method::GET, "/mahasiswa/:id"),
    (Method::PUT, "/mahasiswa/:id"),
    (Method::DELETE, "/mahasiswa/:id"),
];

pub fn routes() -> Result<Router, PatternError> {
    placeholders("mahasiswa", &ROUTES)
}
