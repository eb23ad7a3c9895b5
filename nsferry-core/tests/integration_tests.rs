use std::path::PathBuf;

use nsferry_core::*;

#[test]
fn test_socket_path_validation() {
    // Valid paths
    assert!(SocketPath::new("/tmp/test.sock").is_ok());
    assert!(SocketPath::new("/run/user/1000/handoff").is_ok());
    assert!(SocketPath::new("rendezvous").is_ok());
    assert!(SocketPath::new("./relative/path.sock").is_ok());

    // Invalid paths - empty
    assert!(SocketPath::new("").is_err());

    // Invalid paths - longer than a sockaddr_un can hold
    assert!(SocketPath::new("/".to_string() + &"x".repeat(200)).is_err());
}

#[test]
fn test_socket_path_boundary() {
    let max = "a".repeat(SocketPath::MAX_LENGTH);
    assert!(SocketPath::new(max.clone()).is_ok());

    let over = max + "a";
    let err = SocketPath::new(over).unwrap_err();
    assert!(matches!(err, Error::InvalidPath { .. }));
}

#[test]
fn test_socket_path_serialization() {
    let path = SocketPath::new("/tmp/test.sock").unwrap();

    // Serialize to JSON
    let json = serde_json::to_string(&path).unwrap();
    assert_eq!(json, "\"/tmp/test.sock\"");

    // Deserialize from JSON
    let deserialized: SocketPath = serde_json::from_str(&json).unwrap();
    assert_eq!(path, deserialized);
}

#[test]
fn test_socket_path_display() {
    let path = SocketPath::new("/tmp/test.sock").unwrap();
    assert_eq!(format!("{}", path), "/tmp/test.sock");

    let buf: PathBuf = path.into();
    assert_eq!(buf, PathBuf::from("/tmp/test.sock"));
}

#[test]
fn test_socket_path_from_str() {
    let parsed: SocketPath = "/tmp/test.sock".parse().unwrap();
    assert_eq!(parsed.as_path(), std::path::Path::new("/tmp/test.sock"));

    let bad: Result<SocketPath> = "".parse();
    assert!(bad.is_err());
}

#[test]
fn test_error_messages_name_the_fault() {
    let err = Error::AncillaryLength {
        expected: 6,
        actual: 5,
    };
    assert_eq!(
        err.to_string(),
        "Ancillary record holds 5 descriptors, expected 6"
    );

    let err = Error::CommandBeforeStart { command: "fds" };
    assert_eq!(err.to_string(), "Received fds command before start");

    let err = Error::InvalidCommand { value: 7 };
    assert_eq!(err.to_string(), "Invalid command byte 7 from peer");

    let err = Error::NamespaceClose {
        failures: vec!["ipc", "net"],
    };
    assert_eq!(
        err.to_string(),
        "Failed to close namespace descriptors: ipc, net"
    );
}
