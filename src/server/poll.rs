use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::SocketAddr;

use log::{debug, warn};
use mio::{Events, Interest, Poll, Token};
use mio::net::{TcpListener, TcpStream};

/// The number of IO events processed at a time.
const POLL_EVENT_CAPACITY: usize = 128;

/// Token used for the listener.
const LISTENER_TOKEN: Token = Token(usize::MAX);

/// A bound listening socket together with the poll watching it.
pub struct Listener {
    poll: Poll,
    listener: TcpListener,
}

impl Listener {
    /// Binds to the given address and registers the socket for incoming connections.
    pub fn bind(addr: SocketAddr) -> std::io::Result<Listener> {
        let mut listener = TcpListener::bind(addr)?;
        let poll = Poll::new()?;
        poll.registry().register(&mut listener, LISTENER_TOKEN, Interest::READABLE)?;
        Ok(Listener { poll, listener })
    }

    /// The address the socket is bound to.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accepts connections and watches them for IO. Calls on_new_connection for each new stream, and on_io_ready
    /// for each stream that is ready for reading or writing. The result of on_new_connection is what gets passed to
    /// on_io_ready. After each batch of events, connections is_closed reports on are forgotten. Loops indefinitely.
    pub fn serve<T>(self,
                    on_new_connection: impl Fn(TcpStream, SocketAddr) -> T,
                    on_io_ready: impl Fn(&T),
                    is_closed: impl Fn(&T) -> bool) -> std::io::Result<()> {
        let Listener { mut poll, listener } = self;
        let mut events = Events::with_capacity(POLL_EVENT_CAPACITY);
        let mut connections: HashMap<Token, T> = HashMap::new();
        let mut next_token = 0;

        loop {
            if let Err(err) = poll.poll(&mut events, None) {
                if err.kind() == ErrorKind::Interrupted {
                    continue;
                }
                return Err(err);
            }

            for event in &events {
                match event.token() {
                    LISTENER_TOKEN => {
                        listen_until_blocked(&listener, |(mut stream, addr)| {
                            let token = Token(next_token);
                            next_token = (next_token + 1) % LISTENER_TOKEN.0;
                            poll.registry().register(&mut stream, token, Interest::READABLE | Interest::WRITABLE)?;
                            debug!("Connection {} opened from {}", token.0, addr);
                            connections.insert(token, on_new_connection(stream, addr));
                            Ok(())
                        });
                    }
                    token => {
                        if let Some(connection) = connections.get(&token) {
                            on_io_ready(connection);
                        }
                    }
                }
            }

            connections.retain(|token, connection| {
                let closed = is_closed(connection);
                if closed {
                    debug!("Connection {} closed", token.0);
                }
                !closed
            });
        }
    }
}

/// Accepts new connections to the given listener until blocked. Calls on_connection for each connection stream.
fn listen_until_blocked(listener: &TcpListener, mut on_connection: impl FnMut((TcpStream, SocketAddr)) -> std::io::Result<()>) {
    loop {
        match listener.accept() {
            Ok(conn) => {
                if let Err(err) = on_connection(conn) {
                    warn!("Error initializing connection: {}", err)
                }
            }
            Err(err) if err.kind() == ErrorKind::WouldBlock => break,
            Err(err) => warn!("Error accepting connection: {}", err)
        }
    }
}
