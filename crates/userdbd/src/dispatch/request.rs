//! Request decoding for the dispatch loop.
//!
//! The envelope is decoded first with untyped parameters so that the method
//! name can be inspected before the parameters are bound to a schema.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use userdb_protocol::{
    GetGroupRecordRequestParams, GetMembershipsRequestParams, GetUserRecordRequestParams, Method,
    Request, codec,
};

use super::errors::DispatchError;

/// Request envelope with parameters not yet bound to a method.
#[derive(Debug, Deserialize)]
pub struct RequestEnvelope {
    /// Fully qualified method name.
    pub method: String,
    /// Raw parameters object.
    #[serde(default)]
    pub parameters: Value,
    /// Whether the caller accepts several replies.
    #[serde(default)]
    pub more: bool,
}

impl RequestEnvelope {
    /// Decodes one request frame.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::Read`] if the frame is not a JSON request
    /// envelope.
    pub fn parse(frame: &[u8]) -> Result<Self, DispatchError> {
        codec::parse(frame).map_err(DispatchError::Read)
    }

    /// Binds the parameters to the schema of `method`.
    ///
    /// A missing or `null` parameters value is treated as an empty object.
    ///
    /// # Errors
    ///
    /// Returns [`DispatchError::InvalidParameters`] when the parameters do not
    /// match the schema.
    pub fn into_request<P: DeserializeOwned>(
        self,
        method: Method,
    ) -> Result<Request<P>, DispatchError> {
        let parameters = match self.parameters {
            Value::Null => Value::Object(Map::new()),
            other => other,
        };
        let parameters = serde_json::from_value(parameters)
            .map_err(|source| DispatchError::invalid_parameters(method, source))?;
        Ok(Request {
            method: self.method,
            parameters,
            more: self.more,
        })
    }
}

/// Parameters naming the service a request is addressed to.
pub trait ServiceAddressed {
    /// Target service name.
    fn service(&self) -> &str;
}

impl ServiceAddressed for GetUserRecordRequestParams {
    fn service(&self) -> &str {
        &self.service
    }
}

impl ServiceAddressed for GetGroupRecordRequestParams {
    fn service(&self) -> &str {
        &self.service
    }
}

impl ServiceAddressed for GetMembershipsRequestParams {
    fn service(&self) -> &str {
        &self.service
    }
}
