use log::debug;

use crate::common::header::HeaderMap;
use crate::common::method::Method;
use crate::common::request::Request;
use crate::common::response::Response;
use crate::common::status;
use crate::pipeline::body::{Body, BodyLimits, BodyParser, RejectMalformed};
use crate::pipeline::cors::{Cors, CorsConfig};
use crate::pipeline::request_log::{LogConfig, RequestLog};
use crate::router::RouteTable;

/// Cross-origin policy stage.
pub mod cors;
/// JSON and URL-encoded body parsing stages.
pub mod body;
/// Request logging stage.
pub mod request_log;
/// Extended URL-encoded form decoding.
mod form;

/// One request travelling through the front door.
#[derive(Debug)]
pub struct Exchange {
    /// The request as it was read off the wire.
    pub request: Request,
    /// The parsed body. Empty until the body parsing stage has run.
    pub body: Body,
    /// Headers stages want on the response, whichever stage or route ends up producing it.
    pub response_headers: HeaderMap,
}

impl Exchange {
    pub fn new(request: Request) -> Exchange {
        Exchange { request, body: Body::Empty, response_headers: HeaderMap::new() }
    }
}

/// The result of a stage or route handler.
#[derive(Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Continues with the next stage or route, if any.
    Next,
    /// Stops the exchange and sends the response.
    Respond(Response),
}

/// One step of the middleware pipeline.
pub trait Stage: Send + Sync {
    fn apply(&self, exchange: &mut Exchange) -> Outcome;
}

impl<F> Stage for F where F: Fn(&mut Exchange) -> Outcome + Send + Sync {
    fn apply(&self, exchange: &mut Exchange) -> Outcome {
        self(exchange)
    }
}

/// Configuration for the standard pipeline stages.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub cors: CorsConfig,
    pub body: BodyLimits,
    pub log: LogConfig,
}

/// The entry point for every request: runs the stages in order, then asks the mounted route tables in the order
/// they were mounted. The first response produced wins.
pub struct FrontDoor {
    stages: Vec<Box<dyn Stage>>,
    tables: Vec<Box<dyn RouteTable>>,
}

impl FrontDoor {
    /// Creates a front door with no stages and no route tables. Every request gets the not found response.
    pub fn new() -> FrontDoor {
        FrontDoor { stages: vec![], tables: vec![] }
    }

    /// Creates a front door with the standard stages: CORS, body parsing, logging, then rejection of malformed
    /// bodies. Malformed bodies are rejected after logging so the raw attempt is still logged.
    pub fn standard(config: &PipelineConfig) -> FrontDoor {
        let mut front_door = FrontDoor::new();
        front_door.add_stage(Cors::new(config.cors.clone()));
        front_door.add_stage(BodyParser::new(config.body.clone()));
        front_door.add_stage(RequestLog::new(config.log.clone()));
        front_door.add_stage(RejectMalformed);
        front_door
    }

    /// Adds a stage after the existing ones.
    pub fn add_stage(&mut self, stage: impl Stage + 'static) {
        self.stages.push(Box::new(stage))
    }

    /// Mounts a route table after the existing ones.
    pub fn mount(&mut self, table: impl RouteTable + 'static) {
        self.tables.push(Box::new(table))
    }

    /// Names of the mounted route tables, in mount order.
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|table| table.name()).collect()
    }

    /// Handles a request and produces the response to send back.
    pub fn handle(&self, request: Request) -> Response {
        let mut exchange = Exchange::new(request);
        let mut response = self.respond(&mut exchange);

        // headers set by the responder win over ones collected by stages
        for (header, values) in exchange.response_headers {
            response.headers.entry(header).or_insert(values);
        }
        response
    }

    fn respond(&self, exchange: &mut Exchange) -> Response {
        for stage in &self.stages {
            if let Outcome::Respond(response) = stage.apply(exchange) {
                return response;
            }
        }

        for table in &self.tables {
            if let Outcome::Respond(response) = table.dispatch(exchange) {
                debug!("{} {} handled by {} routes", exchange.request.method, exchange.request.path(), table.name());
                return response;
            }
        }

        not_found(exchange.request.method, exchange.request.path())
    }
}

impl Default for FrontDoor {
    fn default() -> Self {
        FrontDoor::new()
    }
}

/// The response for requests no route handles.
fn not_found(method: Method, path: &str) -> Response {
    Response::html(status::NOT_FOUND, format!("Cannot {} {}", method, path))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};
    use std::thread::{self, ThreadId};

    use log::{LevelFilter, Log, Metadata, Record};
    use serde_json::json;

    use crate::common::header::{ACCESS_CONTROL_ALLOW_ORIGIN, CONTENT_TYPE, HeaderMapOps, ORIGIN, VARY};
    use crate::common::method::Method;
    use crate::common::request::Request;
    use crate::common::response::Response;
    use crate::common::status;
    use crate::header_map;
    use crate::pipeline::{Exchange, FrontDoor, Outcome, PipelineConfig};
    use crate::pipeline::body::Body;
    use crate::pipeline::Outcome::{Next, Respond};
    use crate::router::{Router, RouteTable};

    type Calls = Arc<Mutex<Vec<&'static str>>>;

    fn calls() -> Calls {
        Arc::new(Mutex::new(vec![]))
    }

    fn recording_stage(calls: &Calls, name: &'static str, outcome: fn() -> Outcome) -> impl Fn(&mut Exchange) -> Outcome {
        let calls = Arc::clone(calls);
        move |_| {
            calls.lock().unwrap().push(name);
            outcome()
        }
    }

    fn recording_table(calls: &Calls, name: &'static str, pattern: &str) -> Router {
        let calls = Arc::clone(calls);
        let mut router = Router::new(name);
        router.get(pattern, move |_, _| {
            calls.lock().unwrap().push(name);
            Respond(Response::from(name))
        }).unwrap();
        router
    }

    fn json_request(method: Method, uri: &str, body: &str) -> Request {
        let mut request = Request::new(method, uri);
        request.headers = header_map![(CONTENT_TYPE, "application/json")];
        request.body = body.as_bytes().to_vec();
        request
    }

    #[test]
    fn stages_run_in_order() {
        let calls = calls();
        let mut front_door = FrontDoor::new();
        front_door.add_stage(recording_stage(&calls, "cors", || Next));
        front_door.add_stage(recording_stage(&calls, "body", || Next));
        front_door.add_stage(recording_stage(&calls, "log", || Next));

        front_door.handle(Request::new(Method::GET, "/"));

        assert_eq!(vec!["cors", "body", "log"], *calls.lock().unwrap());
    }

    #[test]
    fn stage_short_circuits() {
        let calls = calls();
        let mut front_door = FrontDoor::new();
        front_door.add_stage(recording_stage(&calls, "first", || Respond(status::BAD_REQUEST.into())));
        front_door.add_stage(recording_stage(&calls, "second", || Next));
        front_door.mount(recording_table(&calls, "auth", "/"));

        let response = front_door.handle(Request::new(Method::GET, "/"));

        assert_eq!(status::BAD_REQUEST, response.status);
        assert_eq!(vec!["first"], *calls.lock().unwrap());
    }

    #[test]
    fn first_mounted_table_wins() {
        let calls = calls();
        let mut front_door = FrontDoor::new();
        front_door.mount(recording_table(&calls, "auth", "/overlap"));
        front_door.mount(recording_table(&calls, "mahasiswa", "/overlap"));

        let response = front_door.handle(Request::new(Method::GET, "/overlap"));

        assert_eq!(b"auth".to_vec(), response.body);
        assert_eq!(vec!["auth"], *calls.lock().unwrap());
    }

    #[test]
    fn later_table_used_when_earlier_does_not_match() {
        let calls = calls();
        let mut front_door = FrontDoor::new();
        front_door.mount(recording_table(&calls, "auth", "/login"));
        front_door.mount(recording_table(&calls, "mahasiswa", "/mahasiswa"));
        front_door.mount(recording_table(&calls, "koordinator", "/koordinator"));

        let response = front_door.handle(Request::new(Method::GET, "/koordinator"));

        assert_eq!(b"koordinator".to_vec(), response.body);
        assert_eq!(vec!["koordinator"], *calls.lock().unwrap());
        assert_eq!(vec!["auth", "mahasiswa", "koordinator"], front_door.table_names());
    }

    #[test]
    fn not_found_when_no_table_matches() {
        let response = FrontDoor::new().handle(Request::new(Method::GET, "/nowhere?x=1"));

        assert_eq!(status::NOT_FOUND, response.status);
        assert_eq!(b"Cannot GET /nowhere".to_vec(), response.body);
    }

    #[test]
    fn stage_headers_added_to_every_response() {
        let mut front_door = FrontDoor::standard(&PipelineConfig::default());
        front_door.mount(recording_table(&calls(), "auth", "/login"));

        let mut request = Request::new(Method::GET, "/login");
        request.headers = header_map![(ORIGIN, "http://localhost:5173")];
        let response = front_door.handle(request.clone());
        assert!(response.headers.contains_header_value(&ACCESS_CONTROL_ALLOW_ORIGIN, "http://localhost:5173"));

        request.uri = "/nowhere".to_string();
        let response = front_door.handle(request);
        assert_eq!(status::NOT_FOUND, response.status);
        assert!(response.headers.contains_header_value(&ACCESS_CONTROL_ALLOW_ORIGIN, "http://localhost:5173"));
        assert!(response.headers.contains_header_value(&VARY, "Origin"));
    }

    #[test]
    fn responder_headers_win() {
        let mut front_door = FrontDoor::new();
        front_door.add_stage(|exchange: &mut Exchange| {
            exchange.response_headers.add_header(VARY, "Origin".to_string());
            Next
        });
        let mut router = Router::new("auth");
        router.get("/", |_, _| Respond(Response::from("hi").with_header(VARY, "Accept"))).unwrap();
        front_door.mount(router);

        let response = front_door.handle(Request::new(Method::GET, "/"));

        assert_eq!(Some(&vec!["Accept".to_string()]), response.headers.get(&VARY));
    }

    #[test]
    fn parsed_body_reaches_handler() {
        let seen = Arc::new(Mutex::new(None));
        let mut front_door = FrontDoor::standard(&PipelineConfig::default());
        let mut router = Router::new("mahasiswa");
        let seen_clone = Arc::clone(&seen);
        router.post("/mahasiswa", move |exchange, _| {
            seen_clone.lock().unwrap().replace(exchange.body.clone());
            Respond(status::CREATED.into())
        }).unwrap();
        front_door.mount(router);

        let response = front_door.handle(json_request(Method::POST, "/mahasiswa", r#"{"nama":"Ana"}"#));

        assert_eq!(status::CREATED, response.status);
        assert_eq!(Some(Body::Json(json!({"nama": "Ana"}))), *seen.lock().unwrap());
    }

    #[test]
    fn malformed_json_never_dispatched() {
        let calls = calls();
        let mut front_door = FrontDoor::standard(&PipelineConfig::default());
        let mut router = Router::new("koordinator");
        let calls_clone = Arc::clone(&calls);
        router.post("/koordinator", move |_, _| {
            calls_clone.lock().unwrap().push("koordinator");
            Respond(status::OK.into())
        }).unwrap();
        front_door.mount(router);

        let response = front_door.handle(json_request(Method::POST, "/koordinator", r#"{"nama": "#));

        assert_eq!(status::BAD_REQUEST, response.status);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[test]
    fn route_tables_are_replaceable() {
        struct Everything;

        impl RouteTable for Everything {
            fn name(&self) -> &str {
                "everything"
            }

            fn register(&mut self, _: Method, _: &str, _: crate::router::Handler) -> Result<(), crate::router::PatternError> {
                Ok(())
            }

            fn matches<'a>(&'a self, _: Method, _: &'a str) -> Box<dyn Iterator<Item=crate::router::RouteMatch<'a>> + 'a> {
                Box::new(std::iter::empty())
            }

            fn dispatch(&self, _: &Exchange) -> Outcome {
                Respond(Response::from("everything"))
            }
        }

        let mut front_door = FrontDoor::new();
        front_door.mount(Everything);
        front_door.mount(recording_table(&calls(), "auth", "/login"));

        let response = front_door.handle(Request::new(Method::GET, "/login"));
        assert_eq!(b"everything".to_vec(), response.body);
    }

    /// Keeps the request log lines written on each thread.
    struct LineCapture {
        lines: Mutex<Vec<(ThreadId, String)>>,
    }

    impl Log for LineCapture {
        fn enabled(&self, metadata: &Metadata) -> bool {
            metadata.target().ends_with("request_log")
        }

        fn log(&self, record: &Record) {
            if self.enabled(record.metadata()) {
                self.lines.lock().unwrap().push((thread::current().id(), record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static LINE_CAPTURE: LineCapture = LineCapture { lines: Mutex::new(Vec::new()) };

    fn logged_lines_on_this_thread() -> Vec<String> {
        let id = thread::current().id();
        LINE_CAPTURE.lines.lock().unwrap().iter()
            .filter(|(thread, _)| *thread == id)
            .map(|(_, line)| line.clone())
            .collect()
    }

    #[test]
    fn malformed_request_logged_before_rejection() {
        let _ = log::set_logger(&LINE_CAPTURE);
        log::set_max_level(LevelFilter::Info);
        let id = thread::current().id();
        LINE_CAPTURE.lines.lock().unwrap().retain(|(thread, _)| *thread != id);

        let calls = calls();
        let mut front_door = FrontDoor::standard(&PipelineConfig::default());
        front_door.mount(recording_table(&calls, "auth", "/login"));

        let mut request = json_request(Method::POST, "/login", r#"{"email":"a@b.c","password":"hunter2""#);
        request.headers.add_header(ORIGIN, "http://localhost:5173".to_string());
        let response = front_door.handle(request);

        assert_eq!(status::BAD_REQUEST, response.status);
        assert!(calls.lock().unwrap().is_empty());

        let lines = logged_lines_on_this_thread();
        assert_eq!(3, lines.len(), "{:?}", lines);
        assert_eq!("POST /login", lines[0]);
        assert!(lines[1].starts_with("Headers: {"));
        assert!(lines[1].contains(r#""origin":"http://localhost:5173""#));
        assert!(lines[2].starts_with("Body: "));
        assert!(!lines[2].contains("hunter2"));
    }
}
