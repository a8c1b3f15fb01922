use feed_readme::github::{decode_content, encode_content, map_status};
use feed_readme_core::error::StoreError;
use reqwest::StatusCode;

#[test]
fn decodes_wrapped_base64_from_the_contents_api() {
    // GitHub wraps the payload every 60 characters
    let encoded = "IyBIZWxsbwo8IS0tU1RBUlRfU0VDVElPTjpmZWVkLS0+Cm9sZAo8IS0tRU5E\nX1NFQ1RJT046ZmVlZC0tPgo=\n";
    let decoded = decode_content(encoded, "README.md").unwrap();
    assert_eq!(
        decoded,
        "# Hello\n<!--START_SECTION:feed-->\nold\n<!--END_SECTION:feed-->\n"
    );
}

#[test]
fn encode_then_decode_preserves_non_ascii_text() {
    let text = "Café – ünïcødé ✓\n";
    assert_eq!(decode_content(&encode_content(text), "README.md").unwrap(), text);
}

#[test]
fn invalid_payloads_are_decode_errors() {
    let err = decode_content("***", "README.md").unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }), "got {err:?}");

    // valid base64, invalid UTF-8
    let err = decode_content("//79", "README.md").unwrap_err();
    assert!(matches!(err, StoreError::Decode { .. }), "got {err:?}");
}

#[test]
fn statuses_map_to_store_errors() {
    let conflict = map_status(
        StatusCode::CONFLICT,
        "README.md does not match abc".into(),
        "README.md",
        "main",
        Some("abc"),
    );
    assert!(
        matches!(&conflict, StoreError::Conflict { path, sha } if path == "README.md" && sha == "abc"),
        "got {conflict:?}"
    );

    let stale = map_status(
        StatusCode::UNPROCESSABLE_ENTITY,
        r#"{"message":"Invalid request.\n\n\"sha\" wasn't supplied."}"#.into(),
        "README.md",
        "main",
        Some("abc"),
    );
    assert!(matches!(stale, StoreError::Conflict { .. }), "got {stale:?}");

    assert!(matches!(
        map_status(StatusCode::UNAUTHORIZED, String::new(), "p", "b", None),
        StoreError::Unauthorized
    ));
    assert!(matches!(
        map_status(StatusCode::FORBIDDEN, String::new(), "p", "b", Some("s")),
        StoreError::Unauthorized
    ));
    assert!(matches!(
        map_status(StatusCode::NOT_FOUND, String::new(), "docs/README.md", "dev", None),
        StoreError::NotFound { ref path, ref branch } if path == "docs/README.md" && branch == "dev"
    ));
    assert!(matches!(
        map_status(StatusCode::BAD_GATEWAY, "upstream".into(), "p", "b", None),
        StoreError::Api { status: 502, .. }
    ));
    // a 409 on a read carries no hash and is passed through
    assert!(matches!(
        map_status(StatusCode::CONFLICT, "repo empty".into(), "p", "b", None),
        StoreError::Api { status: 409, .. }
    ));
}
