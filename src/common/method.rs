use std::fmt::{Display, Formatter};

macro_rules! methods {
    (
        $(
            $(#[$docs:meta])*
            $name:ident;
        )+
    ) => {
        /// An HTTP method.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
        pub enum Method {
            $(
                $(#[$docs])*
                $name,
            )+
        }

        impl Method {
            /// Converts the given string to a method. Methods are case sensitive. Returns None if no Method matches.
            pub fn try_from_str(s: &str) -> Option<Method> {
                match s {
                    $(
                    stringify!($name) => Some(Method::$name),
                    )+
                    _ => None
                }
            }

            /// The method as it appears on the request line.
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(
                    Method::$name => stringify!($name),
                    )+
                }
            }
        }
    }
}

methods! {
    /// GET method.
    GET;
    /// HEAD method. Answered like GET without a body.
    HEAD;
    /// POST method.
    POST;
    /// PUT method.
    PUT;
    /// PATCH method.
    PATCH;
    /// DELETE method.
    DELETE;
    /// OPTIONS method. Used by browsers for CORS preflight requests.
    OPTIONS;
}

impl Display for Method {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
