use std::process::{Command, Output};

fn serlogin(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_serlogin"))
        .args(args)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute serlogin")
}

fn assert_exit(output: &Output, code: i32, stderr_fragment: &str) {
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        output.status.code(),
        Some(code),
        "unexpected exit status, stderr: {stderr}"
    );
    assert!(
        stderr.contains(stderr_fragment),
        "stderr should mention {stderr_fragment:?}, got: {stderr}"
    );
}

#[test]
fn test_version() {
    let output = serlogin(&["--version"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains("serlogin"));
}

#[test]
fn test_missing_user_is_usage_error() {
    let output = serlogin(&["-D", "/dev/null"]);
    assert_exit(&output, 2, "<USER>");
}

#[test]
fn test_unsupported_baud_rate() {
    let output = serlogin(&["-b", "12345", "pi"]);
    assert_exit(&output, 2, "Unsupported baud rate: 12345");
}

#[test]
fn test_invalid_parity() {
    let output = serlogin(&["--parity", "M", "pi"]);
    assert_exit(&output, 2, "Invalid parity");
}

#[test]
fn test_invalid_width() {
    let output = serlogin(&["-w", "9", "pi"]);
    assert_exit(&output, 2, "Invalid byte width 9");
}

#[test]
fn test_invalid_stop_bits() {
    let output = serlogin(&["--stopbits", "1.5", "pi"]);
    assert_exit(&output, 2, "Invalid stop bits");
}

#[test]
fn test_conflicting_flow_control() {
    let output = serlogin(&["--rtscts", "--xonxoff", "pi"]);
    assert_exit(&output, 2, "flow control");
}

#[test]
fn test_invalid_end_time() {
    let output = serlogin(&["-e", "0", "pi"]);
    assert_exit(&output, 3, "Invalid end time");

    let output = serlogin(&["-e", "-5", "pi"]);
    assert_exit(&output, 3, "Invalid end time");
}

#[test]
fn test_empty_user() {
    let output = serlogin(&[""]);
    assert_exit(&output, 3, "User name must not be empty");
}

#[test]
fn test_empty_login_prompt() {
    let output = serlogin(&["-l", "", "pi"]);
    assert_exit(&output, 3, "Login prompt must not be empty");
}

#[test]
fn test_missing_device_fails() {
    let output = serlogin(&["-D", "/dev/serlogin-does-not-exist", "pi"]);
    assert_exit(&output, 4, "Failed to open serial device");
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "failed");
}
