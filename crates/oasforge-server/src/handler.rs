//! The handler interface (§6): `fn(&RequestContext, &Request) -> Response`,
//! object-safe so the route table can store handlers behind `Arc<dyn Handler>`.

use crate::request::Request;
use crate::response::Response;

/// Per-request context handed to a handler alongside the [`Request`] itself.
/// Kept separate from `Request` so a handler can be written without owning
/// the request (both are borrowed).
#[derive(Debug, Default)]
pub struct RequestContext {
    pub operation_id: Option<String>,
}

/// A registered operation handler.
///
/// Object-safe so the route table can store handlers as
/// `Arc<dyn Handler + Send + Sync>`. A blanket impl covers plain closures so
/// most handlers never need to name this trait.
pub trait Handler: Send + Sync {
    fn handle(&self, ctx: &RequestContext, req: &Request) -> Response;
}

impl<F> Handler for F
where
    F: Fn(&RequestContext, &Request) -> Response + Send + Sync,
{
    fn handle(&self, ctx: &RequestContext, req: &Request) -> Response {
        self(ctx, req)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;

    #[test]
    fn closure_satisfies_handler_trait() {
        let handler: Box<dyn Handler> = Box::new(|_: &RequestContext, _: &Request| {
            Response::no_content()
        });
        let ctx = RequestContext::default();
        let req = Request {
            http_request: axum::http::Request::new(axum::body::Body::empty()),
            operation_id: None,
            matched_path: "/pets".to_owned(),
            path_params: Default::default(),
            query_params: Default::default(),
            header_params: Default::default(),
            cookie_params: Default::default(),
            body: None,
            raw_body: None,
        };
        assert_eq!(handler.handle(&ctx, &req).status_code(), StatusCode::NO_CONTENT);
    }
}
