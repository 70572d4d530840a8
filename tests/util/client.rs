use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

/// A response as read off the socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub reason: String,
    /// Header names and values in the order they were sent.
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn body_str(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }
}

pub fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_secs(10))).unwrap();
    stream
}

/// Sends the raw bytes and reads until the server closes the connection. The last request sent should ask for the
/// connection to be closed.
pub fn send_raw(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = connect(addr);
    stream.write_all(raw).unwrap();
    let mut output = vec![];
    stream.read_to_end(&mut output).unwrap();
    output
}

/// Sends the requests on one connection and parses every response.
pub fn send(addr: SocketAddr, raw: &str) -> Vec<RawResponse> {
    parse_responses(&send_raw(addr, raw.as_bytes()), false)
}

/// Sends a single request and returns its response.
pub fn send_one(addr: SocketAddr, raw: &str) -> RawResponse {
    let mut responses = send(addr, raw);
    assert_eq!(1, responses.len(), "expected exactly one response");
    responses.remove(0)
}

/// Splits the output of a connection into responses. Bodies are delimited by content-length, unless head_only is
/// set, in which case no response has a body.
pub fn parse_responses(mut output: &[u8], head_only: bool) -> Vec<RawResponse> {
    let mut responses = vec![];
    while !output.is_empty() {
        let head_end = output.windows(4).position(|window| window == b"\r\n\r\n").expect("incomplete response head");
        let head = String::from_utf8(output[..head_end].to_vec()).unwrap();
        let mut lines = head.split("\r\n");

        let status_line = lines.next().unwrap();
        let mut parts = status_line.splitn(3, ' ');
        assert_eq!(Some("HTTP/1.1"), parts.next());
        let status = parts.next().unwrap().parse().unwrap();
        let reason = parts.next().unwrap_or_default().to_string();

        let headers: Vec<(String, String)> = lines
            .map(|line| {
                let (name, value) = line.split_once(": ").unwrap();
                (name.to_string(), value.to_string())
            })
            .collect();

        let length: usize = if head_only {
            0
        } else {
            headers.iter()
                .find(|(name, _)| name == "content-length")
                .map(|(_, value)| value.parse().unwrap())
                .unwrap_or(0)
        };

        let body_start = head_end + 4;
        let body = output[body_start..body_start + length].to_vec();
        output = &output[body_start + length..];

        responses.push(RawResponse { status, reason, headers, body });
    }
    responses
}
