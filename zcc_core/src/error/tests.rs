//! Tests for error rendering and constructor helpers.

use super::*;
use camino::Utf8Path;
use rstest::rstest;

#[rstest]
fn missing_file_maps_to_input_not_found() {
    let err = read_error(
        Utf8Path::new("conf/zowe.yaml"),
        std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
    );
    assert!(matches!(&*err, ZccError::InputNotFound { path } if path == "conf/zowe.yaml"));
    assert_eq!(err.to_string(), "no such file or directory: 'conf/zowe.yaml'");
}

#[rstest]
fn other_io_failures_keep_their_source() {
    let err = read_error(
        Utf8Path::new("zowe.yaml"),
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    );
    assert!(matches!(&*err, ZccError::File { .. }));
    assert!(err.to_string().contains("denied"));
}

#[rstest]
#[case(precondition("Environment WORKSPACE_DIR is required"), "Environment WORKSPACE_DIR is required")]
#[case(
    malformed(Utf8Path::new("instance.env"), "Invalid env line: oops"),
    "malformed input in 'instance.env': Invalid env line: oops"
)]
#[case(
    invalid_path("a..b", "empty key segment"),
    "invalid configuration path 'a..b': empty key segment"
)]
#[case(
    edit_error("zowe.externalPort", "edit does not read back as the requested value"),
    "cannot edit 'zowe.externalPort': edit does not read back as the requested value"
)]
fn messages_render_without_prefixes(#[case] err: std::sync::Arc<ZccError>, #[case] expected: &str) {
    assert_eq!(err.to_string(), expected);
}
