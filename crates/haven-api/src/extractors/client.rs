//! Client metadata for session bookkeeping.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;

use haven_auth::token::DeviceInfo;

/// Device and network facts taken from request headers.
///
/// Never fails: a client that sends nothing simply gets an anonymous
/// session record.
#[derive(Debug, Clone, Default)]
pub struct ClientMeta {
    pub device_id: Option<String>,
    pub user_agent: Option<String>,
    pub ip_address: Option<String>,
}

impl ClientMeta {
    /// Builds the `DeviceInfo` for token issuance.
    ///
    /// A device id in the request body wins over the `x-device-id`
    /// header.
    pub fn device_info(&self, preferred_device_id: Option<String>) -> DeviceInfo {
        DeviceInfo {
            device_id: preferred_device_id.or_else(|| self.device_id.clone()),
            user_agent: self.user_agent.clone(),
            ip_address: self.ip_address.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for ClientMeta
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header_string = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(String::from)
        };

        let ip_address = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.split(',').next())
            .map(|value| value.trim().to_string());

        Ok(Self {
            device_id: header_string("x-device-id"),
            user_agent: parts
                .headers
                .get(header::USER_AGENT)
                .and_then(|value| value.to_str().ok())
                .map(String::from),
            ip_address,
        })
    }
}
