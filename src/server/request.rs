use http::Method;
use serde_json::Value;

use super::transformer::{JsonRpcTransformer, JsonTransformer, TransformError, Transformer};
use crate::ids::RequestId;

/// Content type that marks a JSON-RPC call.
pub const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";

/// The request as seen by the dispatcher.
pub trait Request {
    fn http_method(&self) -> &Method;

    /// Raw request target: path plus query string.
    fn request_url(&self) -> &str;

    fn is(&self, method: &Method) -> bool {
        self.http_method() == method
    }

    /// Parameters decoded from the body, `None` when there is no body.
    fn params(&self) -> Result<Option<Value>, TransformError>;

    fn is_json_rpc(&self) -> bool {
        self.transformer().rpc_method().is_some()
    }

    fn transformer(&self) -> &dyn Transformer;

    fn request_id(&self) -> Option<RequestId> {
        None
    }
}

/// Default [`Request`] implementation over an owned body.
pub struct IncomingRequest {
    method: Method,
    url: String,
    body: String,
    transformer: Box<dyn Transformer>,
    request_id: Option<RequestId>,
}

impl IncomingRequest {
    /// A body-less request using the JSON transformer.
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            body: String::new(),
            transformer: Box::new(JsonTransformer),
            request_id: None,
        }
    }

    #[must_use]
    pub fn with_json_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self.transformer = Box::new(JsonTransformer);
        self
    }

    /// Attach a JSON-RPC envelope; fails when the envelope is malformed.
    pub fn with_rpc_body(mut self, body: impl Into<String>) -> Result<Self, TransformError> {
        let body = body.into();
        self.transformer = Box::new(JsonRpcTransformer::from_body(&body)?);
        self.body = body;
        Ok(self)
    }

    #[must_use]
    pub fn with_request_id(mut self, id: RequestId) -> Self {
        self.request_id = Some(id);
        self
    }

    /// Adapt an `http::Request`. The transformer follows `content-type`, and `x-request-id` is
    /// reused when it carries a valid ULID.
    pub fn from_http(req: http::Request<String>) -> Result<Self, TransformError> {
        let (parts, body) = req.into_parts();
        let url = parts
            .uri
            .path_and_query()
            .map_or_else(|| parts.uri.path().to_owned(), |pq| pq.as_str().to_owned());
        let header = |name: &str| parts.headers.get(name).and_then(|v| v.to_str().ok());

        let is_rpc = header("content-type")
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with(JSON_RPC_CONTENT_TYPE))
            .unwrap_or(false);
        let request_id = RequestId::from_header_or_new(header("x-request-id"));

        let request = IncomingRequest::new(parts.method, url).with_request_id(request_id);
        if is_rpc {
            request.with_rpc_body(body)
        } else {
            Ok(request.with_json_body(body))
        }
    }

    pub fn body(&self) -> &str {
        &self.body
    }
}

impl Request for IncomingRequest {
    fn http_method(&self) -> &Method {
        &self.method
    }

    fn request_url(&self) -> &str {
        &self.url
    }

    fn params(&self) -> Result<Option<Value>, TransformError> {
        if self.body.trim().is_empty() {
            return Ok(None);
        }
        let value = self.transformer.decode(&self.body)?;
        Ok((!value.is_null()).then_some(value))
    }

    fn transformer(&self) -> &dyn Transformer {
        self.transformer.as_ref()
    }

    fn request_id(&self) -> Option<RequestId> {
        self.request_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plain_request() {
        let req = IncomingRequest::new(Method::GET, "/user/edit/1?x=2");
        assert!(req.is(&Method::GET));
        assert_eq!(req.request_url(), "/user/edit/1?x=2");
        assert!(req.params().unwrap().is_none());
        assert!(!req.is_json_rpc());
    }

    #[test]
    fn test_from_http_json() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/rest/api/3?debug=1")
            .header("content-type", "application/json")
            .body(r#"{"name":"kit"}"#.to_string())
            .unwrap();
        let req = IncomingRequest::from_http(req).unwrap();
        assert_eq!(req.http_method(), &Method::POST);
        assert_eq!(req.request_url(), "/rest/api/3?debug=1");
        assert_eq!(req.params().unwrap(), Some(json!({"name": "kit"})));
        assert!(req.request_id().is_some());
    }

    #[test]
    fn test_from_http_rpc() {
        let req = http::Request::builder()
            .method("POST")
            .uri("/rpc")
            .header("content-type", "application/json-rpc")
            .body(r#"{"jsonrpc":"2.0","method":"sum","params":[1,2],"id":1}"#.to_string())
            .unwrap();
        let req = IncomingRequest::from_http(req).unwrap();
        assert!(req.is_json_rpc());
        assert_eq!(req.transformer().rpc_method(), Some("sum"));
        assert_eq!(req.params().unwrap(), Some(json!([1, 2])));
    }

    #[test]
    fn test_malformed_body_surfaces_on_params() {
        let req = IncomingRequest::new(Method::POST, "/x").with_json_body("{oops");
        assert!(req.params().is_err());
    }
}
