use crate::{consts, models::request::RequestContext};
use ntex::{
    http::Payload,
    web::{Error, FromRequest, HttpRequest},
};

/// Builds the [RequestContext] of the current request
fn get_request_context(req: &HttpRequest) -> RequestContext {
    let inbound_id = req
        .headers()
        .get(consts::REQUEST_ID_HEADER)
        .and_then(|value| value.to_str().ok());

    RequestContext::new(inbound_id, req.method().as_str(), req.path())
}

impl<Err> FromRequest<Err> for RequestContext {
    type Error = Error;

    fn from_request(
        req: &HttpRequest,
        _: &mut Payload,
    ) -> impl std::future::Future<Output = Result<Self, Self::Error>> {
        futures::future::ready(Ok(get_request_context(req)))
    }
}
