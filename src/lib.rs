/// Command-line argument parser
pub mod args;
/// HTTP data types.
pub mod common;
/// Logger setup.
pub mod logging;
/// Components for parsing HTTP requests.
pub(crate) mod parse;
/// The middleware pipeline every request goes through.
pub mod pipeline;
/// Route tables and pattern matching.
pub mod router;
/// The route groups mounted on the front door.
pub mod routes;
/// Components for running an HTTP server and handling requests.
pub mod server;

/// Utility components.
pub mod util;
