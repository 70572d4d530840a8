use std::net::SocketAddr;
use std::thread::spawn;

use frontdoor::pipeline::{FrontDoor, PipelineConfig};
use frontdoor::routes;
use frontdoor::server::{Config, Server};

/// Starts a server on a free local port in a background thread and returns its address. The listener is bound
/// before this returns, so clients can connect right away.
pub fn start_server(front_door: FrontDoor) -> SocketAddr {
    let server = Server::bind(Config {
        addr: String::from("127.0.0.1:0"),
        workers: 4,
        front_door,
    }).unwrap();
    let addr = server.local_addr().unwrap();

    spawn(move || server.run().unwrap());
    addr
}

/// Starts a server with every route group mounted and the default pipeline settings.
pub fn start_app() -> SocketAddr {
    start_app_with(PipelineConfig::default())
}

pub fn start_app_with(config: PipelineConfig) -> SocketAddr {
    start_server(routes::app(&config).unwrap())
}
