/// An HTTP status.
#[derive(Debug, Eq, PartialEq, Copy, Clone)]
pub struct Status {
    /// The status code.
    pub code: u16,
    /// The reason for the status.
    pub reason: &'static str,
}

macro_rules! status_codes {
    (
        $(
            $(#[$docs:meta])*
            ($name:ident, $num:expr, $phrase:expr);
        )+
    ) => {
        $(
            $(#[$docs])*
            pub const $name: Status = Status { code: $num, reason: $phrase };
        )+

        impl Status {
            /// Gets the status from the given status code.
            pub fn from_code(code: u16) -> Option<Status> {
                match code {
                    $(
                    $num => Some($name),
                    )+
                    _ => None
                }
            }
        }
    }
}

status_codes! {
    (OK, 200, "OK");
    (CREATED, 201, "Created");
    (NO_CONTENT, 204, "No Content");
    (BAD_REQUEST, 400, "Bad Request");
    (UNAUTHORIZED, 401, "Unauthorized");
    (FORBIDDEN, 403, "Forbidden");
    (NOT_FOUND, 404, "Not Found");
    (METHOD_NOT_ALLOWED, 405, "Method Not Allowed");
    (PAYLOAD_TOO_LARGE, 413, "Payload Too Large");
    (UNSUPPORTED_MEDIA_TYPE, 415, "Unsupported Media Type");
    (INTERNAL_SERVER_ERROR, 500, "Internal Server Error");
    (NOT_IMPLEMENTED, 501, "Not Implemented");
}
