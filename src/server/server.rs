use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::{Arc, Mutex, TryLockError};

use log::{debug, info, warn};

use crate::common::header::CONTENT_LENGTH;
use crate::common::method::Method;
use crate::common::response::Response;
use crate::common::version::HTTP_VERSION_1_1;
use crate::pipeline::FrontDoor;
use crate::server::config::Config;
use crate::server::connection::Connection;
use crate::server::connection::ReadRequestResult::{Closed, Error, NotReady, Ready};
use crate::server::poll::Listener;
use crate::util::thread_pool::ThreadPool;

/// Raw bytes for a request decoding error response.
const REQUEST_PARSING_ERROR_RESPONSE: &[u8] = b"HTTP/1.1 400 Bad Request\r\ncontent-length: 0\r\nconnection: close\r\n\r\n";

/// A connection shared between the poll thread and the workers. None once the connection is done.
type SharedConnection<S> = Arc<Mutex<Option<Connection<S>>>>;

/// An HTTP server bound to its address.
pub struct Server {
    listener: Listener,
    config: Config,
}

impl Server {
    /// Binds the listening socket for the given config.
    pub fn bind(config: Config) -> std::io::Result<Server> {
        let addr = resolve(&config.addr)?;
        let listener = Listener::bind(addr)?;
        Ok(Server { listener, config })
    }

    /// The address the server is listening on.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Serves connections. This function blocks.
    pub fn run(self) -> std::io::Result<()> {
        let port = self.local_addr()?.port();
        let Server { listener, config } = self;

        let thread_pool = ThreadPool::new("frontdoor-worker", config.workers)?;
        let front_door = Arc::new(config.front_door);

        info!("Server is running on port {}", port);
        debug!("Handling connections on {} worker threads", thread_pool.size());

        listener.serve(
            |socket, addr| Arc::new(Mutex::new(Some(Connection::new(addr, socket)))),
            |connection| {
                let connection = Arc::clone(connection);
                let front_door = Arc::clone(&front_door);
                thread_pool.execute(move || handle_io_ready_connection(&front_door, &connection));
            },
            is_finished,
        )
    }
}

/// Starts an HTTP server. This function blocks.
pub fn listen_http(config: Config) -> std::io::Result<()> {
    Server::bind(config)?.run()
}

fn resolve(addr: &str) -> std::io::Result<SocketAddr> {
    addr.to_socket_addrs()?
        .next()
        .ok_or_else(|| std::io::Error::new(ErrorKind::InvalidInput, format!("no address found for {}", addr)))
}

/// Checks if the connection is done with. Connections being worked on are never done.
fn is_finished<S: Read + Write>(connection: &SharedConnection<S>) -> bool {
    match connection.try_lock() {
        Ok(lock) => lock.is_none(),
        Err(TryLockError::WouldBlock) => false,
        Err(TryLockError::Poisoned(_)) => true,
    }
}

/// Tries reading requests and responding for the given connection. Drops the connection if it should be closed.
fn handle_io_ready_connection<S: Read + Write>(front_door: &FrontDoor, connection: &SharedConnection<S>) {
    let mut lock = match connection.lock() {
        Ok(lock) => lock,
        Err(_) => return,
    };

    if let Some(mut connection) = lock.take() {
        // first try to flush any existing unflushed data
        if let Err(err) = connection.flush() {
            debug!("Dropping connection from {}: {}", connection.addr, err);
            return;
        }

        if !connection.is_closing() && respond_to_requests(&mut connection, front_door) {
            connection.close_after_flush();
        }

        // keep a closing connection around until its responses are out
        if !connection.is_closing() || connection.has_pending_output() {
            lock.replace(connection);
        }
    }
}

/// Responds to requests in the given connection using the front door. Returns true if the connection should be
/// closed.
fn respond_to_requests<S: Read + Write>(connection: &mut Connection<S>, front_door: &FrontDoor) -> bool {
    loop {
        match connection.read_request() {
            Ready(request) => {
                let close = request.closes_connection();
                let head_only = request.method == Method::HEAD;
                let response = front_door.handle(request);
                if write_response(connection, &response, head_only, close).is_err() || close {
                    return true;
                }
            }
            NotReady => return false,
            Closed => return true,
            Error(error) => {
                warn!("Bad request from {}: {}", connection.addr, error);
                let _ = connection.write_all(REQUEST_PARSING_ERROR_RESPONSE).and_then(|_| connection.flush());
                return true;
            }
        }
    }
}

/// Writes the response as bytes to the given writer. Headers are written in name order, followed by the
/// content-length of the body. Responses to HEAD requests leave the body out.
pub fn write_response(writer: &mut impl Write, response: &Response, head_only: bool, close: bool) -> std::io::Result<()> {
    // write! will call write multiple times and does not flush
    write!(writer, "{} {} {}\r\n", HTTP_VERSION_1_1, response.status.code, response.status.reason)?;

    let mut headers: Vec<_> = response.headers.iter().filter(|(header, _)| **header != CONTENT_LENGTH).collect();
    headers.sort_by(|(a, _), (b, _)| a.as_str().cmp(b.as_str()));
    for (header, values) in headers {
        for value in values {
            write!(writer, "{}: {}\r\n", header, value)?;
        }
    }
    write!(writer, "{}: {}\r\n", CONTENT_LENGTH, response.body.len())?;
    if close {
        writer.write_all(b"connection: close\r\n")?;
    }
    writer.write_all(b"\r\n")?;

    if !head_only {
        writer.write_all(&response.body)?;
    }
    writer.flush()
}
