pub mod request_id;

pub use request_id::{request_span, request_id_middleware, RequestId};
