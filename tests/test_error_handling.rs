use minisnip::error::Error;
use minisnip::Rect;

#[test]
fn test_buffer_creation_error_with_context() {
    let err = Error::BufferCreation("mmap failed: Permission denied".to_string());
    assert!(err.to_string().contains("Buffer creation failed"));
    assert!(err.to_string().contains("Permission denied"));
}

#[test]
fn test_io_with_context_error() {
    let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let err = Error::IoWithContext {
        operation: "writing '/tmp/minisnip_x.png'".to_string(),
        source: io_err,
    };
    assert!(err.to_string().contains("IO error during"));
    assert!(err.to_string().contains("minisnip_x.png"));
    assert!(err.to_string().contains("file not found"));
}

#[test]
fn test_invalid_geometry_from_parse() {
    let err = "100x100".parse::<Rect>().unwrap_err();
    assert!(matches!(err, Error::InvalidGeometry(_)));
    assert_eq!(err.to_string(), "Invalid geometry format: 100x100");
}

#[test]
fn test_protocol_errors() {
    let err = Error::UnsupportedProtocol("zwlr_layer_shell_v1 not available".to_string());
    assert!(err.to_string().contains("zwlr_layer_shell_v1"));

    let err = Error::FrameCapture("compositor reported failure".to_string());
    assert_eq!(err.to_string(), "Frame capture failed: compositor reported failure");

    assert_eq!(Error::NoOutputs.to_string(), "No outputs available");
}

#[test]
fn test_save_into_missing_directory_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing").join("snip.png");
    let err = minisnip::encode::save_png(&[0u8; 4], 1, 1, &path).unwrap_err();
    assert!(matches!(err, Error::IoWithContext { .. }));
    assert!(err.to_string().contains("snip.png"));
}
