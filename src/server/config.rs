use crate::pipeline::FrontDoor;

/// The config for an HTTP server.
pub struct Config {
    /// The address to bind the server listener to, such as "0.0.0.0:5000".
    pub addr: String,
    /// The number of threads handling connections. Each thread works on one connection at a time.
    pub workers: usize,
    /// Handles every request the server reads.
    pub front_door: FrontDoor,
}
