//! JSON body parser.
//!
//! ```text
//! PUT /end-devices/14aab0a4
//! Content-Type: application/json
//!
//! {"app_id":"appid","app_url":"myhandler.com:3000","nwks_key":"000102030405060708090a0b0c0d0e0f"}
//! ```

use super::{match_route, require_media_type, RawRequest, RegistrationParser};
use crate::domain::error::{fields, ParseError, StructuralError, ValidationError};
use serde_json::{Map, Value};
use shared_types::{DevAddr, NwkSKey, Recipient, Registration};

/// Parser for `application/json` registration bodies.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRegistrationParser;

impl JsonRegistrationParser {
    pub const CONTENT_TYPE: &'static str = "application/json";

    /// Encode `registration` as the request body this parser accepts.
    pub fn encode_body(registration: &Registration) -> String {
        serde_json::json!({
            "app_id": registration.recipient.id,
            "app_url": registration.recipient.address,
            "nwks_key": registration.options.to_hex(),
        })
        .to_string()
    }
}

impl RegistrationParser for JsonRegistrationParser {
    fn check_structure(&self, request: &RawRequest<'_>) -> Result<(), StructuralError> {
        match_route(request)?;
        require_media_type(request, Self::CONTENT_TYPE)
    }

    fn parse(&self, request: &RawRequest<'_>) -> Result<Registration, ParseError> {
        let segment = match_route(request)?;
        require_media_type(request, Self::CONTENT_TYPE)?;

        let dev_addr: DevAddr = segment.parse().map_err(|source| ValidationError::InvalidHex {
            field: fields::DEV_ADDR,
            source,
        })?;

        let body: Value = serde_json::from_slice(request.body)
            .map_err(|e| ValidationError::MalformedBody(e.to_string()))?;
        let object = body
            .as_object()
            .ok_or_else(|| ValidationError::MalformedBody("expected a JSON object".into()))?;

        let app_id = non_empty_string(object, fields::APP_ID)?;
        let app_url = non_empty_string(object, fields::APP_URL)?;
        let nwks_key: NwkSKey = string_field(object, fields::NWKS_KEY)?
            .parse()
            .map_err(|source| ValidationError::InvalidHex {
                field: fields::NWKS_KEY,
                source,
            })?;

        Ok(Registration {
            dev_addr,
            recipient: Recipient {
                id: app_id.to_string(),
                address: app_url.to_string(),
            },
            options: nwks_key,
        })
    }
}

fn string_field<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    match object.get(field) {
        None | Some(Value::Null) => Err(ValidationError::MissingField(field)),
        Some(Value::String(s)) => Ok(s),
        Some(_) => Err(ValidationError::NotAString(field)),
    }
}

fn non_empty_string<'a>(
    object: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, ValidationError> {
    let value = string_field(object, field)?;
    if value.is_empty() {
        return Err(ValidationError::EmptyField(field));
    }
    Ok(value)
}
