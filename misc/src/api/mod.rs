pub mod event;
pub mod registration;
pub mod user;

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const HEALTHZ_PATH: &str = "/v1/healthz";

pub const HEADER_AUTHORIZATION: &str = "Authorization";

#[macro_export]
macro_rules! parse_from_map {
    ($fields:expr,$field:expr) => {
        match $fields.get($field) {
            Some(value) => match value.parse() {
                Ok(value) => Some(value),
                Err(_) => anyhow::bail!(format!("{} is invalid", $field)),
            },
            None => None,
        }
    };
}

/// A request parsed from the query string and, for requests that carry a
/// payload, from a JSON body.
pub trait Request: Default {
    fn complete(&mut self, _fields: HashMap<String, String>) -> Result<()> {
        Ok(())
    }

    fn is_data(&self) -> bool {
        false
    }

    fn set_data(&mut self, _data: Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Decodes a JSON body into `T`, used by requests whose payload does not fit
/// into query fields.
pub fn decode_json<T: DeserializeOwned>(data: &[u8]) -> Result<T> {
    if data.is_empty() {
        bail!("empty json body");
    }
    serde_json::from_slice(data).context("decode json body")
}

#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyRequest;

impl Request for EmptyRequest {}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct QueryRequest {
    pub offset: Option<u64>,
    pub limit: Option<u64>,

    pub search: Option<String>,
}

const DEFAULT_LIMIT: u64 = 10;
const MAX_LIMIT: u64 = 500;

impl Request for QueryRequest {
    fn complete(&mut self, mut fields: HashMap<String, String>) -> Result<()> {
        self.offset = parse_from_map!(fields, "offset");
        self.limit = parse_from_map!(fields, "limit");
        match self.limit {
            None => self.limit = Some(DEFAULT_LIMIT),
            Some(limit) if limit > MAX_LIMIT => bail!("limit must be less than {MAX_LIMIT}"),
            Some(_) => {}
        }
        self.search = fields.remove("search").filter(|s| !s.is_empty());

        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct Response<T: Serialize + DeserializeOwned> {
    pub code: u32,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

pub const STATUS_OK: u32 = 200;
pub const STATUS_BAD_REQUEST: u32 = 400;
pub const STATUS_UNAUTHORIZED: u32 = 401;
pub const STATUS_FORBIDDEN: u32 = 403;
pub const STATUS_NOT_FOUND: u32 = 404;
pub const STATUS_INTERNAL_SERVER_ERROR: u32 = 500;

impl<T: Serialize + DeserializeOwned> Response<T> {
    pub fn ok() -> Self {
        Self {
            code: STATUS_OK,
            message: None,
            data: None,
        }
    }

    pub fn with_data(data: T) -> Self {
        Self {
            code: STATUS_OK,
            message: None,
            data: Some(data),
        }
    }

    pub fn bad_request(message: impl ToString) -> Self {
        Self::error(STATUS_BAD_REQUEST, message)
    }

    /// The caller could not be authenticated.
    pub fn unauthorized(message: impl ToString) -> Self {
        Self::error(STATUS_UNAUTHORIZED, message)
    }

    pub fn not_found(message: impl ToString) -> Self {
        Self::error(STATUS_NOT_FOUND, message)
    }

    pub fn resource_not_found() -> Self {
        Self::not_found("Resource not found")
    }

    pub fn internal_server_error(message: impl ToString) -> Self {
        Self::error(STATUS_INTERNAL_SERVER_ERROR, message)
    }

    /// The caller is authenticated but the permission engine denied the
    /// operation.
    pub fn forbidden() -> Self {
        Self::error(STATUS_FORBIDDEN, "Unauthorized")
    }

    pub fn database_error() -> Self {
        Self::internal_server_error("Database error")
    }

    pub fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    fn error(code: u32, message: impl ToString) -> Self {
        Self {
            code,
            message: Some(message.to_string()),
            data: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(bound = "T: Serialize + DeserializeOwned")]
pub struct ListResponse<T: Serialize + DeserializeOwned> {
    pub items: Vec<T>,
    pub total: u64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub version: String,
    pub timestamp: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_query_request() {
        let mut query = QueryRequest::default();
        query.complete(HashMap::new()).unwrap();
        assert_eq!(query.limit, Some(DEFAULT_LIMIT));
        assert_eq!(query.offset, None);

        let mut query = QueryRequest::default();
        query
            .complete(fields(&[("limit", "20"), ("offset", "5"), ("search", "dance")]))
            .unwrap();
        assert_eq!(
            query,
            QueryRequest {
                offset: Some(5),
                limit: Some(20),
                search: Some(String::from("dance")),
            }
        );

        let mut query = QueryRequest::default();
        assert!(query.complete(fields(&[("limit", "abc")])).is_err());

        let mut query = QueryRequest::default();
        assert!(query.complete(fields(&[("limit", "10000")])).is_err());
    }

    #[test]
    fn test_response_serialize() {
        let resp: Response<()> = Response::forbidden();
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"code":403,"message":"Unauthorized"}"#);

        let resp = Response::with_data(ListResponse {
            items: vec![1, 2],
            total: 2,
        });
        let json = serde_json::to_string(&resp).unwrap();
        assert_eq!(json, r#"{"code":200,"data":{"items":[1,2],"total":2}}"#);
    }
}
