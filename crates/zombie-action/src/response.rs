use crate::{from_parts, ActionError, ActionResult, Detail, EngineReply};

/// Status assumed for a reply with no status and no error.
pub const DEFAULT_STATUS_SUCCESS: u16 = 200;
/// Status assumed for a reply with an error but no status.
pub const DEFAULT_STATUS_ERROR: u16 = 500;

/// A successful engine reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    pub data: Vec<u8>,
    pub status: u16,
    pub url: Option<String>,
}

/// Validate an engine reply.
///
/// An error indicator or a status outside `200..300` is a network failure;
/// a reply that passes both checks but carries no payload is a decoding
/// failure.
pub fn handle_reply(reply: EngineReply) -> ActionResult<Response> {
    let EngineReply {
        payload,
        status,
        url,
        error,
    } = reply;

    let status = status.unwrap_or(if error.is_none() {
        DEFAULT_STATUS_SUCCESS
    } else {
        DEFAULT_STATUS_ERROR
    });

    if let Some(message) = error {
        return Err(ActionError::NetworkRequestFailure(
            Detail::new().status(status).message(message),
        ));
    }
    if !(200..300).contains(&status) {
        return Err(ActionError::status(status));
    }

    let data = from_parts(None, payload)?;
    Ok(Response { data, status, url })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn test_success_defaults_to_200() {
        let response = handle_reply(EngineReply::ok("<html></html>").url("https://a.test")).unwrap();
        assert_eq!(response.status, 200);
        assert_eq!(response.data, b"<html></html>");
        assert_eq!(response.url.as_deref(), Some("https://a.test"));
    }

    #[test]
    fn test_error_defaults_to_500() {
        let err = handle_reply(EngineReply::failed("connection refused")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkRequestFailure);
        assert_eq!(err.status_code(), Some(500));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_error_keeps_reported_status() {
        let err = handle_reply(EngineReply::failed("bad gateway").status(502)).unwrap_err();
        assert_eq!(err.status_code(), Some(502));
    }

    #[test]
    fn test_non_success_status() {
        let err = handle_reply(EngineReply::ok("not found").status(404)).unwrap_err();
        assert_eq!(err, ActionError::status(404));

        assert!(handle_reply(EngineReply::ok("moved").status(204)).is_ok());
    }

    #[test]
    fn test_missing_payload_is_decoding_failure() {
        let err = handle_reply(EngineReply::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DecodingFailure);

        let err = handle_reply(EngineReply::default().status(404)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NetworkRequestFailure);
    }
}
