//! Response shaping: JSON or XML delivery of routing decisions and errors.
//!
//! The delivery format follows the `Accept` header: exactly
//! `application/xml` selects XML, anything else (including no header)
//! selects JSON.

use std::io;

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};
use serde_json::Value;

use crate::body::ResponseBody;
use crate::dispatch::RoutingDecision;
use crate::error::ApiError;

/// JSON content type.
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// XML content type.
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// How a response payload is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeliveryFormat {
    /// `application/json`
    #[default]
    Json,
    /// `application/xml`
    Xml,
}

impl DeliveryFormat {
    /// Pick the format for an `Accept` header value.
    ///
    /// ```
    /// use restgate_http::DeliveryFormat;
    ///
    /// assert_eq!(DeliveryFormat::from_accept(Some("application/xml")), DeliveryFormat::Xml);
    /// assert_eq!(DeliveryFormat::from_accept(Some("text/html, application/xml")), DeliveryFormat::Json);
    /// assert_eq!(DeliveryFormat::from_accept(None), DeliveryFormat::Json);
    /// ```
    #[must_use]
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some(XML_CONTENT_TYPE) => Self::Xml,
            _ => Self::Json,
        }
    }

    /// The `Content-Type` for this format.
    #[must_use]
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Json => JSON_CONTENT_TYPE,
            Self::Xml => XML_CONTENT_TYPE,
        }
    }
}

/// Serialize an error as `{"code": ..., "message": ...}`.
#[must_use]
pub fn error_to_json(error: &ApiError) -> Vec<u8> {
    serde_json::to_vec(&serde_json::json!({
        "code": error.client_code(),
        "message": error.message,
    }))
    .expect("JSON serialization of error cannot fail")
}

/// Serialize an error as `<Error><Code/><Message/></Error>`.
#[must_use]
pub fn error_to_xml(error: &ApiError) -> Vec<u8> {
    let mut buf = Vec::with_capacity(128);
    if let Err(e) = write_error_xml(&mut buf, error.client_code(), &error.message) {
        tracing::error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(buf: &mut Vec<u8>, code: &str, message: &str) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.create_element("Error").write_inner_content(|w| {
        w.create_element("Code")
            .write_text_content(BytesText::new(code))?;
        w.create_element("Message")
            .write_text_content(BytesText::new(message))?;
        Ok(())
    })?;
    Ok(())
}

/// Serialize a routing decision as XML.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <RoutingDecision>
///   <Controller>Form</Controller>
///   <Method>Update</Method>
///   <Arguments><Argument name="field">override</Argument></Arguments>
///   <RequestMethod>PUT</RequestMethod>
///   <EffectiveMethod>POST</EffectiveMethod>
/// </RoutingDecision>
/// ```
#[must_use]
pub fn decision_to_xml(decision: &RoutingDecision) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_decision_xml(&mut buf, decision) {
        tracing::error!(error = %e, "failed to serialize routing decision XML");
        buf.clear();
    }
    buf
}

fn write_decision_xml(buf: &mut Vec<u8>, decision: &RoutingDecision) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer
        .create_element("RoutingDecision")
        .write_inner_content(|w| {
            w.create_element("Controller")
                .write_text_content(BytesText::new(&decision.controller))?;
            w.create_element("Method")
                .write_text_content(BytesText::new(&decision.method))?;
            w.create_element("Arguments").write_inner_content(|w| {
                for (name, value) in &decision.arguments {
                    let text = match value {
                        Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    w.create_element("Argument")
                        .with_attribute(("name", name.as_str()))
                        .write_text_content(BytesText::new(&text))?;
                }
                Ok(())
            })?;
            if let Some(application) = &decision.application {
                w.create_element("Application")
                    .write_text_content(BytesText::new(application))?;
            }
            if let Some(identity) = &decision.identity {
                w.create_element("Identity")
                    .write_text_content(BytesText::new(identity.as_str()))?;
            }
            w.create_element("RequestMethod")
                .write_text_content(BytesText::new(decision.request_method.as_str()))?;
            w.create_element("EffectiveMethod")
                .write_text_content(BytesText::new(decision.effective_method.as_str()))?;
            if !decision.uploads.is_empty() {
                w.create_element("Uploads").write_inner_content(|w| {
                    for upload in &decision.uploads {
                        w.create_element("Upload")
                            .with_attribute(("field", upload.field.as_str()))
                            .with_attribute(("filename", upload.filename.as_str()))
                            .write_text_content(BytesText::new(
                                &upload.path.display().to_string(),
                            ))?;
                    }
                    Ok(())
                })?;
            }
            Ok(())
        })?;
    Ok(())
}

/// Build the success response for a routing decision.
#[must_use]
pub fn decision_to_response(
    decision: &RoutingDecision,
    format: DeliveryFormat,
) -> http::Response<ResponseBody> {
    let payload = match format {
        DeliveryFormat::Json => serde_json::to_vec(decision)
            .expect("JSON serialization of routing decision cannot fail"),
        DeliveryFormat::Xml => decision_to_xml(decision),
    };
    http::Response::builder()
        .status(http::StatusCode::OK)
        .header(http::header::CONTENT_TYPE, format.content_type())
        .body(ResponseBody::from_bytes(payload))
        .expect("valid routing decision response")
}

/// Convert an `ApiError` into a complete HTTP error response.
#[must_use]
pub fn error_to_response(error: &ApiError, format: DeliveryFormat) -> http::Response<ResponseBody> {
    let payload = match format {
        DeliveryFormat::Json => error_to_json(error),
        DeliveryFormat::Xml => error_to_xml(error),
    };
    http::Response::builder()
        .status(error.status_code)
        .header(http::header::CONTENT_TYPE, format.content_type())
        .body(ResponseBody::from_bytes(payload))
        .expect("valid error response")
}
