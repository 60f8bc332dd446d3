use super::*;

#[test]
fn reads_server_provided_message() {
    assert_eq!(
        error_message_from_body(br#"{"error":"unsupported format"}"#),
        "unsupported format"
    );
}

#[test]
fn unparseable_body_uses_fallback() {
    assert_eq!(
        error_message_from_body(b"<html>502 Bad Gateway</html>"),
        FALLBACK_PROCESSING_ERROR
    );
    assert_eq!(error_message_from_body(b""), FALLBACK_PROCESSING_ERROR);
}

#[test]
fn missing_or_empty_field_uses_fallback() {
    assert_eq!(
        error_message_from_body(br#"{"detail":"nope"}"#),
        FALLBACK_PROCESSING_ERROR
    );
    assert_eq!(
        error_message_from_body(br#"{"error":""}"#),
        FALLBACK_PROCESSING_ERROR
    );
    assert_eq!(
        error_message_from_body(br#"{"error":null}"#),
        FALLBACK_PROCESSING_ERROR
    );
}

#[test]
fn non_string_error_field_uses_fallback() {
    assert_eq!(
        error_message_from_body(br#"{"error":42}"#),
        FALLBACK_PROCESSING_ERROR
    );
}

#[test]
fn error_body_serializes_as_single_field() {
    let json = serde_json::to_string(&ErrorBody::new("Invalid file type")).expect("json");
    assert_eq!(json, r#"{"error":"Invalid file type"}"#);
}

#[test]
fn status_text_prefixes_message() {
    let err = ClassifiedError::new(ErrorKind::Transport, "connection refused");
    assert_eq!(err.status_text(), "Error: connection refused");
}
