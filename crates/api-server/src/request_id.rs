use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest caller-supplied id that is reused as is.
const MAX_INCOMING_LEN: usize = 128;

/// Per-request id, available to handlers as an `Extension`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    /// Keep the caller's id when it is short printable ASCII, else mint a UUID v4.
    fn from_request(request: &Request) -> Self {
        let incoming = request
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|id| {
                !id.is_empty()
                    && id.len() <= MAX_INCOMING_LEN
                    && id.bytes().all(|b| b.is_ascii_graphic())
            });

        match incoming {
            Some(id) => RequestId(id.to_string()),
            None => RequestId(Uuid::new_v4().to_string()),
        }
    }
}

/// Tags the request span with its id and echoes the id on the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let id = RequestId::from_request(&request);
    tracing::Span::current().record("request_id", id.0.as_str());

    let header = HeaderValue::from_str(&id.0).ok();
    request.extensions_mut().insert(id);

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    fn request_with(id: Option<&str>) -> Request {
        let mut builder = Request::builder().uri("/health");
        if let Some(id) = id {
            builder = builder.header(REQUEST_ID_HEADER, id);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[test]
    fn test_incoming_id_reused() {
        let id = RequestId::from_request(&request_with(Some(" trace-42 ")));
        assert_eq!(id, RequestId("trace-42".to_string()));
    }

    #[test]
    fn test_unusable_ids_replaced() {
        let long = "x".repeat(MAX_INCOMING_LEN + 1);
        for bad in [None, Some(""), Some("has space"), Some(long.as_str())] {
            let id = RequestId::from_request(&request_with(bad));
            assert!(Uuid::parse_str(&id.0).is_ok(), "{:?} kept", bad);
        }
    }
}
