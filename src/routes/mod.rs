use log::warn;
use serde::Serialize;
use serde_json::Value;

use crate::common::header::CONTENT_TYPE;
use crate::common::method::Method;
use crate::common::response::Response;
use crate::common::status;
use crate::header_map;
use crate::pipeline::{Exchange, FrontDoor, Outcome, PipelineConfig};
use crate::router::{Params, PatternError, Router};

/// Login, logout, registration and session routes.
pub mod auth;
/// Student routes.
pub mod mahasiswa;
/// Coordinator routes.
pub mod koordinator;

/// Builds the front door with the standard stages and the route groups mounted in order: auth, mahasiswa,
/// koordinator.
pub fn app(config: &PipelineConfig) -> Result<FrontDoor, PatternError> {
    let mut front_door = FrontDoor::standard(config);
    front_door.mount(auth::routes()?);
    front_door.mount(mahasiswa::routes()?);
    front_door.mount(koordinator::routes()?);
    Ok(front_door)
}

/// What a placeholder handler answers with: the binding that matched and what it received.
#[derive(Serialize)]
struct Acknowledgement<'a> {
    group: &'a str,
    route: String,
    params: Value,
    body: Value,
}

/// Builds a router named after the group whose bindings all acknowledge the request.
fn placeholders(group: &'static str, bindings: &[(Method, &'static str)]) -> Result<Router, PatternError> {
    let mut router = Router::new(group);
    for &(method, pattern) in bindings {
        router.on(method, pattern, acknowledge(group, method, pattern))?;
    }
    Ok(router)
}

/// A handler that acknowledges the matched route as JSON without doing anything else.
fn acknowledge(group: &'static str, method: Method, route: &'static str) -> impl Fn(&Exchange, &Params) -> Outcome + Send + Sync {
    move |exchange, params| {
        let acknowledgement = Acknowledgement {
            group,
            route: format!("{} {}", method, route),
            params: params.to_json(),
            body: exchange.body.to_value(),
        };

        match serde_json::to_vec(&acknowledgement) {
            Ok(body) => Outcome::Respond(Response {
                status: status::OK,
                headers: header_map![(CONTENT_TYPE, "application/json; charset=utf-8")],
                body,
            }),
            Err(err) => {
                warn!("Could not serialize response for {} {}: {}", group, route, err);
                Outcome::Respond(status::INTERNAL_SERVER_ERROR.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use crate::common::header::{CONTENT_TYPE, HeaderMapOps};
    use crate::common::method::Method;
    use crate::common::request::Request;
    use crate::common::status;
    use crate::header_map;
    use crate::pipeline::PipelineConfig;
    use crate::routes::app;

    fn json_body(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[test]
    fn groups_mounted_in_order() {
        let front_door = app(&PipelineConfig::default()).unwrap();
        assert_eq!(vec!["auth", "mahasiswa", "koordinator"], front_door.table_names());
    }

    #[test]
    fn login() {
        let front_door = app(&PipelineConfig::default()).unwrap();
        let response = front_door.handle(Request::new(Method::GET, "/login"));

        assert_eq!(status::OK, response.status);
        assert!(response.headers.contains_header_value(&CONTENT_TYPE, "application/json; charset=utf-8"));
        assert_eq!(
            json!({"group": "auth", "route": "GET /login", "params": {}, "body": {}}),
            json_body(&response.body)
        );
    }

    #[test]
    fn mahasiswa_with_params_and_body() {
        let front_door = app(&PipelineConfig::default()).unwrap();
        let mut request = Request::new(Method::PUT, "/mahasiswa/2101");
        request.headers = header_map![(CONTENT_TYPE, "application/x-www-form-urlencoded")];
        request.body = b"nama=Ana&hobi[]=catur".to_vec();

        let response = front_door.handle(request);

        assert_eq!(status::OK, response.status);
        assert_eq!(
            json!({
                "group": "mahasiswa",
                "route": "PUT /mahasiswa/:id",
                "params": {"id": "2101"},
                "body": {"nama": "Ana", "hobi": ["catur"]}
            }),
            json_body(&response.body)
        );
    }

    #[test]
    fn koordinator_delete() {
        let front_door = app(&PipelineConfig::default()).unwrap();
        let response = front_door.handle(Request::new(Method::DELETE, "/koordinator/9"));

        assert_eq!("koordinator", json_body(&response.body)["group"]);
        assert_eq!("DELETE /koordinator/:id", json_body(&response.body)["route"]);
    }

    #[test]
    fn head_request_uses_get_route() {
        let front_door = app(&PipelineConfig::default()).unwrap();
        let response = front_door.handle(Request::new(Method::HEAD, "/me"));

        assert_eq!(status::OK, response.status);
        assert_eq!("GET /me", json_body(&response.body)["route"]);
    }

    #[test]
    fn unknown_route() {
        let front_door = app(&PipelineConfig::default()).unwrap();
        let response = front_door.handle(Request::new(Method::PATCH, "/mahasiswa/1"));

        assert_eq!(status::NOT_FOUND, response.status);
        assert_eq!(b"Cannot PATCH /mahasiswa/1".to_vec(), response.body);
    }
}
