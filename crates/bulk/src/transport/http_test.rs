//! Tests for the HTTP transport setup

use super::*;

#[test]
fn test_config_defaults() {
    let config = HttpTransportConfig::default();
    assert_eq!(config.url, DEFAULT_URL);
    assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    assert!(config.database.is_none());
    assert!(config.username.is_none());
}

#[test]
fn test_config_builder() {
    let config = HttpTransportConfig::new("http://ch:8123")
        .with_database("analytics")
        .with_credentials("loader", Some("secret".into()))
        .with_timeout(Duration::from_secs(5));

    assert_eq!(config.database.as_deref(), Some("analytics"));
    assert_eq!(config.username.as_deref(), Some("loader"));
    assert_eq!(config.password.as_deref(), Some("secret"));
    assert_eq!(config.timeout, Duration::from_secs(5));
}

#[test]
fn test_endpoint_carries_database() {
    let transport =
        HttpTransport::new(HttpTransportConfig::new("http://ch:8123").with_database("my db")).unwrap();
    assert_eq!(transport.endpoint().as_str(), "http://ch:8123/?database=my+db");
}

#[test]
fn test_endpoint_without_database() {
    let transport = HttpTransport::new(HttpTransportConfig::new("http://ch:8123/")).unwrap();
    assert_eq!(transport.endpoint().query(), None);
}

#[test]
fn test_invalid_url() {
    let err = HttpTransport::new(HttpTransportConfig::new("not a url")).unwrap_err();
    assert!(matches!(err, TransportError::InvalidUrl { .. }));
}

#[test]
fn test_parse_exception_code() {
    assert_eq!(
        parse_exception_code("Code: 60. DB::Exception: Table default.x does not exist"),
        Some(60)
    );
    assert_eq!(parse_exception_code("  Code:516. DB::Exception"), Some(516));
    assert_eq!(parse_exception_code("Internal Server Error"), None);
    assert_eq!(parse_exception_code("Code: . oops"), None);
}

#[test]
fn test_server_error_display() {
    let err = TransportError::Server {
        status: 404,
        code: Some(60),
        body: "Code: 60. DB::Exception: missing".into(),
    };
    assert_eq!(
        err.to_string(),
        "server returned HTTP 404 (code 60): Code: 60. DB::Exception: missing"
    );

    let err = TransportError::Server {
        status: 500,
        code: None,
        body: "boom".into(),
    };
    assert_eq!(err.to_string(), "server returned HTTP 500: boom");
}
