//! Cross-origin resource sharing
//!
//! Allowed origins are echoed back with credentials enabled; other origins
//! get no CORS headers at all. Preflight requests are answered here without
//! reaching the router.

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{
    HeaderValue, ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS,
    ACCESS_CONTROL_ALLOW_METHODS, ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_EXPOSE_HEADERS,
    ACCESS_CONTROL_MAX_AGE, VARY,
};
use hyper::{Response, StatusCode};

use crate::config::CorsArgs;
use crate::types::ApiError;

/// Preflight cache lifetime: 12 hours
const MAX_AGE_SECS: u64 = 12 * 60 * 60;

#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origins: Vec<String>,
    allow_any: bool,
    methods: HeaderValue,
    headers: HeaderValue,
}

impl CorsPolicy {
    pub fn from_args(args: &CorsArgs) -> Result<Self, ApiError> {
        let origins: Vec<String> = args.origins().map(str::to_string).collect();
        let allow_any = origins.iter().any(|o| o == "*");

        Ok(Self {
            origins,
            allow_any,
            methods: header_list("CORS_ALLOWED_METHODS", &args.allowed_methods)?,
            headers: header_list("CORS_ALLOWED_HEADERS", &args.allowed_headers)?,
        })
    }

    pub fn allows(&self, origin: &str) -> bool {
        self.allow_any || self.origins.iter().any(|o| o == origin)
    }

    /// Add CORS headers to `response` when `origin` is allowed
    pub fn apply<B>(&self, origin: Option<&HeaderValue>, response: &mut Response<B>) {
        let Some(origin) = self.allowed_origin(origin) else {
            return;
        };

        let headers = response.headers_mut();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, origin.clone());
        headers.append(VARY, HeaderValue::from_static("Origin"));
        headers.insert(
            ACCESS_CONTROL_ALLOW_CREDENTIALS,
            HeaderValue::from_static("true"),
        );
        headers.insert(
            ACCESS_CONTROL_EXPOSE_HEADERS,
            HeaderValue::from_static("Content-Length"),
        );
    }

    /// Answer an `OPTIONS` request
    pub fn preflight(&self, origin: Option<&HeaderValue>) -> Response<Full<Bytes>> {
        let mut response = Response::new(Full::new(Bytes::new()));
        *response.status_mut() = StatusCode::NO_CONTENT;

        if self.allowed_origin(origin).is_some() {
            let headers = response.headers_mut();
            headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
            headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
            headers.insert(ACCESS_CONTROL_MAX_AGE, HeaderValue::from(MAX_AGE_SECS));
        }
        response
    }

    fn allowed_origin<'a>(&self, origin: Option<&'a HeaderValue>) -> Option<&'a HeaderValue> {
        origin.filter(|value| value.to_str().map(|o| self.allows(o)).unwrap_or(false))
    }
}

fn header_list(name: &str, values: &[String]) -> Result<HeaderValue, ApiError> {
    let joined = values
        .iter()
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .collect::<Vec<_>>()
        .join(", ");

    HeaderValue::from_str(&joined)
        .map_err(|e| ApiError::Config(format!("invalid {}: {}", name, e)))
}
