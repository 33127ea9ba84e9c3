//! S3-compatible error response bodies
//!
//! Storage endpoints answer a rejected pre-signed PUT with an XML document:
//!
//! ```xml
//! <Error>
//!   <Code>SignatureDoesNotMatch</Code>
//!   <Message>The request signature we calculated does not match...</Message>
//!   <RequestId>4442587FB7D0A2F9</RequestId>
//! </Error>
//! ```

use serde::Deserialize;

/// Parsed `<Error>` document
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct S3ErrorBody {
    pub code: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub request_id: Option<String>,
}

/// Parse an error body, `None` when it is not an S3 error document
pub fn parse_error_body(body: &str) -> Option<S3ErrorBody> {
    if body.trim().is_empty() {
        return None;
    }
    quick_xml::de::from_str(body).ok()
}
