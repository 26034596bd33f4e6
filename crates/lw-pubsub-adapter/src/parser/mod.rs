//! Registration payload parsers.
//!
//! The intake only knows the [`RegistrationParser`] capability. New body
//! formats are new parser implementations; the intake is not touched.

pub mod json;

pub use json::JsonRegistrationParser;

use crate::domain::error::{ParseError, StructuralError};
use shared_types::Registration;

/// Route prefix for registrations
pub const END_DEVICES_PREFIX: &str = "/end-devices/";

/// The parts of an HTTP request a parser may look at.
#[derive(Debug, Clone, Copy)]
pub struct RawRequest<'a> {
    /// HTTP method, e.g. `"PUT"`
    pub method: &'a str,
    /// URL path without query string
    pub path: &'a str,
    /// `Content-Type` header value, if any
    pub content_type: Option<&'a str>,
    /// Full request body
    pub body: &'a [u8],
}

/// Turns a raw request into a [`Registration`].
pub trait RegistrationParser: Send + Sync + 'static {
    /// Parse and validate `request`.
    ///
    /// Structural problems (method, path, content type) must be reported
    /// before any validation problem of the same request.
    fn parse(&self, request: &RawRequest<'_>) -> Result<Registration, ParseError>;

    /// Check method, path and content type only; `request.body` is empty.
    ///
    /// Runs before the body is read, so structural problems win over body
    /// size limits. Must agree with the structural checks of
    /// [`parse`](Self::parse).
    fn check_structure(&self, request: &RawRequest<'_>) -> Result<(), StructuralError> {
        let _ = request;
        Ok(())
    }
}

impl<P: RegistrationParser + ?Sized> RegistrationParser for Box<P> {
    fn parse(&self, request: &RawRequest<'_>) -> Result<Registration, ParseError> {
        (**self).parse(request)
    }

    fn check_structure(&self, request: &RawRequest<'_>) -> Result<(), StructuralError> {
        (**self).check_structure(request)
    }
}

/// Check method and path; returns the raw `devAddr` path segment.
///
/// Shared by parsers that serve `PUT /end-devices/{devAddr}`.
pub fn match_route<'a>(request: &RawRequest<'a>) -> Result<&'a str, StructuralError> {
    if request.method != "PUT" {
        return Err(StructuralError::MethodNotAllowed(request.method.to_string()));
    }

    request
        .path
        .strip_prefix(END_DEVICES_PREFIX)
        .filter(|segment| !segment.is_empty() && !segment.contains('/'))
        .ok_or_else(|| StructuralError::NotFound(request.path.to_string()))
}

/// Check the request media type, ignoring parameters such as `charset`.
pub fn require_media_type(
    request: &RawRequest<'_>,
    expected: &str,
) -> Result<(), StructuralError> {
    let matches = request
        .content_type
        .and_then(|ct| ct.split(';').next())
        .is_some_and(|media| media.trim().eq_ignore_ascii_case(expected));

    if matches {
        Ok(())
    } else {
        Err(StructuralError::UnsupportedMediaType(
            request.content_type.map(str::to_string),
        ))
    }
}

/// Path of the registration route for `dev_addr`.
pub fn registration_path(dev_addr: &shared_types::DevAddr) -> String {
    format!("{}{}", END_DEVICES_PREFIX, dev_addr)
}
