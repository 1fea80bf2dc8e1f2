use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;

/// Request body could not be decoded, or a result could not be encoded.
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid JSON-RPC envelope: {0}")]
    Rpc(String),
}

/// Body codec chosen per request from its content type.
pub trait Transformer: Send + Sync {
    /// Content type of encoded responses.
    fn content_type(&self) -> &'static str;

    fn decode(&self, body: &str) -> Result<Value, TransformError>;

    fn encode(&self, value: &Value) -> Result<String, TransformError>;

    /// Method named by an RPC envelope. Plain transformers have none.
    fn rpc_method(&self) -> Option<&str> {
        None
    }
}

/// Plain JSON bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonTransformer;

impl Transformer for JsonTransformer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn decode(&self, body: &str) -> Result<Value, TransformError> {
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(body)?)
    }

    fn encode(&self, value: &Value) -> Result<String, TransformError> {
        Ok(serde_json::to_string(value)?)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope {
    jsonrpc: Option<String>,
    method: String,
    #[serde(default)]
    params: Value,
    #[serde(default)]
    id: Value,
}

impl Envelope {
    fn parse(body: &str) -> Result<Self, TransformError> {
        let envelope: Envelope = serde_json::from_str(body)?;
        match envelope.jsonrpc.as_deref() {
            Some("2.0") | None => {}
            Some(other) => {
                return Err(TransformError::Rpc(format!(
                    "unsupported jsonrpc version `{other}`"
                )))
            }
        }
        if envelope.method.is_empty() {
            return Err(TransformError::Rpc("empty method name".into()));
        }
        Ok(envelope)
    }
}

/// JSON-RPC 2.0 bodies. The envelope is parsed once when the request is built; `decode`
/// yields its `params` and `encode` wraps results with the request `id`.
#[derive(Debug, Clone)]
pub struct JsonRpcTransformer {
    method: String,
    id: Value,
}

impl JsonRpcTransformer {
    pub fn from_body(body: &str) -> Result<Self, TransformError> {
        let envelope = Envelope::parse(body)?;
        Ok(Self {
            method: envelope.method,
            id: envelope.id,
        })
    }

    pub fn id(&self) -> &Value {
        &self.id
    }
}

impl Transformer for JsonRpcTransformer {
    fn content_type(&self) -> &'static str {
        "application/json"
    }

    fn decode(&self, body: &str) -> Result<Value, TransformError> {
        Ok(Envelope::parse(body)?.params)
    }

    fn encode(&self, value: &Value) -> Result<String, TransformError> {
        Ok(serde_json::to_string(&json!({
            "jsonrpc": "2.0",
            "result": value,
            "id": self.id,
        }))?)
    }

    fn rpc_method(&self) -> Option<&str> {
        Some(self.method.as_str())
    }
}
