use crate::common::method::Method;
use crate::pipeline::{Exchange, Outcome};
pub use crate::router::pattern::{Params, Pattern, PatternError};

/// Route pattern parsing and matching.
pub mod pattern;

/// A route handler. Gets the exchange and the parameters captured from the path.
/// Returning [Outcome::Next] declines the request so later routes get a chance at it.
pub type Handler = Box<dyn Fn(&Exchange, &Params) -> Outcome + Send + Sync>;

/// A binding that matched a request.
pub struct RouteMatch<'a> {
    /// The method the binding was registered for.
    pub method: Method,
    /// The pattern the binding was registered with.
    pub pattern: &'a str,
    pub params: Params,
    pub handler: &'a Handler,
}

/// A group of routes mounted on the front door.
pub trait RouteTable: Send + Sync {
    /// Name of the group, used in logs.
    fn name(&self) -> &str;

    /// Binds a handler to requests with the method and a path matching the pattern.
    fn register(&mut self, method: Method, pattern: &str, handler: Handler) -> Result<(), PatternError>;

    /// Every binding that matches the method and path, in registration order.
    fn matches<'a>(&'a self, method: Method, path: &'a str) -> Box<dyn Iterator<Item=RouteMatch<'a>> + 'a>;

    /// The first binding that matches the method and path.
    fn find<'a>(&'a self, method: Method, path: &'a str) -> Option<RouteMatch<'a>> {
        self.matches(method, path).next()
    }

    /// Calls matching handlers in order until one responds.
    fn dispatch(&self, exchange: &Exchange) -> Outcome {
        let request = &exchange.request;
        for route in self.matches(request.method, request.path()) {
            if let Outcome::Respond(response) = (route.handler)(exchange, &route.params) {
                return Outcome::Respond(response);
            }
        }
        Outcome::Next
    }
}

struct Binding {
    method: Method,
    pattern: Pattern,
    handler: Handler,
}

impl Binding {
    /// HEAD requests are also answered by GET bindings.
    fn accepts(&self, method: Method) -> bool {
        self.method == method || (method == Method::HEAD && self.method == Method::GET)
    }
}

/// A route table matching paths against `:param` patterns.
pub struct Router {
    name: String,
    bindings: Vec<Binding>,
}

impl Router {
    /// Creates a new empty router.
    pub fn new(name: impl Into<String>) -> Router {
        Router { name: name.into(), bindings: Vec::new() }
    }

    /// Calls the handler on requests with the given method and a path matching the pattern.
    pub fn on(&mut self, method: Method, pattern: &str,
              handler: impl Fn(&Exchange, &Params) -> Outcome + 'static + Send + Sync) -> Result<(), PatternError> {
        self.register(method, pattern, Box::new(handler))
    }

    pub fn get(&mut self, pattern: &str, handler: impl Fn(&Exchange, &Params) -> Outcome + 'static + Send + Sync) -> Result<(), PatternError> {
        self.on(Method::GET, pattern, handler)
    }

    pub fn post(&mut self, pattern: &str, handler: impl Fn(&Exchange, &Params) -> Outcome + 'static + Send + Sync) -> Result<(), PatternError> {
        self.on(Method::POST, pattern, handler)
    }

    pub fn put(&mut self, pattern: &str, handler: impl Fn(&Exchange, &Params) -> Outcome + 'static + Send + Sync) -> Result<(), PatternError> {
        self.on(Method::PUT, pattern, handler)
    }

    pub fn patch(&mut self, pattern: &str, handler: impl Fn(&Exchange, &Params) -> Outcome + 'static + Send + Sync) -> Result<(), PatternError> {
        self.on(Method::PATCH, pattern, handler)
    }

    pub fn delete(&mut self, pattern: &str, handler: impl Fn(&Exchange, &Params) -> Outcome + 'static + Send + Sync) -> Result<(), PatternError> {
        self.on(Method::DELETE, pattern, handler)
    }
}

impl RouteTable for Router {
    fn name(&self) -> &str {
        &self.name
    }

    fn register(&mut self, method: Method, pattern: &str, handler: Handler) -> Result<(), PatternError> {
        let pattern = Pattern::parse(pattern)?;
        self.bindings.push(Binding { method, pattern, handler });
        Ok(())
    }

    fn matches<'a>(&'a self, method: Method, path: &'a str) -> Box<dyn Iterator<Item=RouteMatch<'a>> + 'a> {
        Box::new(self.bindings.iter()
            .filter(move |binding| binding.accepts(method))
            .filter_map(move |binding| {
                let params = binding.pattern.captures(path)?;
                Some(RouteMatch { method: binding.method, pattern: binding.pattern.as_str(), params, handler: &binding.handler })
            }))
    }
}
