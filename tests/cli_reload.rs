//! E2E tests for the `reload-server` binary
//!
//! These spawn the real binary, drive it through the file system and signals,
//! and inspect its log output and HTTP responses.

#![cfg(unix)]

use std::fs;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};
use tempfile::tempdir;

fn free_port() -> u16 {
    TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

fn wait_for_port(port: u16, timeout: Duration) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if TcpStream::connect(("127.0.0.1", port)).is_ok() {
            return true;
        }
        thread::sleep(Duration::from_millis(50));
    }
    false
}

fn wait_for_exit(child: &mut Child, timeout: Duration) -> Option<ExitStatus> {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if let Some(status) = child.try_wait().unwrap() {
            return Some(status);
        }
        thread::sleep(Duration::from_millis(50));
    }
    None
}

fn send_signal(child: &Child, signal: libc::c_int) {
    let rc = unsafe { libc::kill(child.id() as libc::pid_t, signal) };
    assert_eq!(rc, 0, "failed to signal {}", child.id());
}

fn interrupt(child: &Child) {
    send_signal(child, libc::SIGINT);
}

fn http_get(port: u16, path: &str) -> String {
    let mut stream = TcpStream::connect(("127.0.0.1", port)).unwrap();
    write!(stream, "GET {} HTTP/1.1\r\nHost: localhost\r\n\r\n", path).unwrap();
    let mut response = String::new();
    stream.read_to_string(&mut response).unwrap();
    response
}

fn spawn_dev(dir: &Path, port: u16, extra: &[&str]) -> Child {
    Command::new(env!("CARGO_BIN_EXE_reload-server"))
        .arg("--port")
        .arg(port.to_string())
        .args(extra)
        .current_dir(dir)
        .env("RUST_LOG", "info")
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start reload-server")
}

fn setup_site(dir: &Path) {
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::write(dir.join("src").join("index.html"), "<h1>v1</h1>").unwrap();
}

/// Test that `serve` answers requests from its document root
#[test]
fn serve_answers_from_document_root() {
    let temp = tempdir().unwrap();
    fs::write(temp.path().join("index.html"), "<h1>home</h1>").unwrap();
    let port = free_port();

    let mut child = Command::new(env!("CARGO_BIN_EXE_reload-server"))
        .arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--document-root")
        .arg(temp.path())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to start reload-server serve");

    assert!(wait_for_port(port, Duration::from_secs(10)), "server never listened");

    let home = http_get(port, "/");
    assert!(home.starts_with("HTTP/1.1 200 OK"), "got: {}", home);
    assert!(home.ends_with("<h1>home</h1>"));

    let missing = http_get(port, "/missing.js");
    assert!(missing.starts_with("HTTP/1.1 404 Not Found"), "got: {}", missing);

    let _ = child.kill();
    let _ = child.wait();
}

/// A burst of saves restarts once; a later save restarts again
#[test]
fn dev_restarts_once_per_debounce_window() {
    let temp = tempdir().unwrap();
    setup_site(temp.path());
    let index = temp.path().join("src").join("index.html");
    let port = free_port();

    let mut child = spawn_dev(temp.path(), port, &[]);
    assert!(wait_for_port(port, Duration::from_secs(10)), "server never listened");
    thread::sleep(Duration::from_millis(1000));

    fs::write(&index, "<h1>v2</h1>").unwrap();
    thread::sleep(Duration::from_millis(100));
    fs::write(&index, "<h1>v3</h1>").unwrap();

    thread::sleep(Duration::from_millis(1500));
    fs::write(&index, "<h1>v4</h1>").unwrap();
    thread::sleep(Duration::from_millis(2000));

    assert!(wait_for_port(port, Duration::from_secs(10)), "server not back after restart");
    let page = http_get(port, "/src/index.html");
    assert!(page.ends_with("<h1>v4</h1>"), "got: {}", page);

    interrupt(&child);
    let status = wait_for_exit(&mut child, Duration::from_secs(15)).expect("did not exit");
    assert!(status.success(), "exit status: {}", status);

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert_eq!(
        stderr.matches("Restarting server").count(),
        2,
        "log output:\n{}",
        stderr
    );
    assert!(stderr.contains("File changed: index.html"), "log output:\n{}", stderr);
}

/// Irrelevant files never restart the server
#[test]
fn dev_ignores_irrelevant_files() {
    let temp = tempdir().unwrap();
    setup_site(temp.path());
    let port = free_port();

    let mut child = spawn_dev(temp.path(), port, &[]);
    assert!(wait_for_port(port, Duration::from_secs(10)), "server never listened");
    thread::sleep(Duration::from_millis(1000));

    fs::write(temp.path().join("src").join("logo.png"), [0u8; 32]).unwrap();
    fs::write(temp.path().join("notes.txt"), "scratch").unwrap();
    thread::sleep(Duration::from_millis(1500));

    interrupt(&child);
    let status = wait_for_exit(&mut child, Duration::from_secs(15)).expect("did not exit");
    assert!(status.success(), "exit status: {}", status);

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("Restarting server"), "log output:\n{}", stderr);
}

/// Ctrl+C stops the watcher and the server, then exits cleanly
#[test]
fn dev_interrupt_stops_server_and_exits() {
    let temp = tempdir().unwrap();
    setup_site(temp.path());
    let port = free_port();

    let mut child = spawn_dev(temp.path(), port, &["-w", "missing", "-w", "."]);
    assert!(wait_for_port(port, Duration::from_secs(10)), "server never listened");

    interrupt(&child);
    let status = wait_for_exit(&mut child, Duration::from_secs(15)).expect("did not exit");
    assert!(status.success(), "exit status: {}", status);
    assert!(
        TcpStream::connect(("127.0.0.1", port)).is_err(),
        "server still listening after shutdown"
    );

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Watching: ."), "log output:\n{}", stderr);
    assert!(!stderr.contains("Watching: missing"), "log output:\n{}", stderr);
    assert!(stderr.contains("Development server stopped"), "log output:\n{}", stderr);
}

fn assert_signal_shuts_down(signal: libc::c_int) {
    let temp = tempdir().unwrap();
    setup_site(temp.path());
    let port = free_port();

    let mut child = spawn_dev(temp.path(), port, &[]);
    assert!(wait_for_port(port, Duration::from_secs(10)), "server never listened");

    send_signal(&child, signal);
    let status = wait_for_exit(&mut child, Duration::from_secs(15)).expect("did not exit");
    assert!(status.success(), "exit status: {}", status);
    assert!(
        TcpStream::connect(("127.0.0.1", port)).is_err(),
        "server still listening after shutdown"
    );

    let output = child.wait_with_output().unwrap();
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Shutting down"), "log output:\n{}", stderr);
    assert!(stderr.contains("Development server stopped"), "log output:\n{}", stderr);
}

/// SIGTERM shuts down the same way as Ctrl+C
#[test]
fn dev_sigterm_stops_server_and_exits() {
    assert_signal_shuts_down(libc::SIGTERM);
}

/// SIGHUP shuts down the same way as Ctrl+C
#[test]
fn dev_sighup_stops_server_and_exits() {
    assert_signal_shuts_down(libc::SIGHUP);
}

/// `--log-file` receives plain lines; an unknown timezone falls back to UTC
#[test]
fn dev_mirrors_plain_log_lines_to_file() {
    let temp = tempdir().unwrap();
    setup_site(temp.path());
    let log_path = temp.path().join("dev.log");
    let port = free_port();

    let mut child = spawn_dev(
        temp.path(),
        port,
        &[
            "--log-file",
            log_path.to_str().unwrap(),
            "--log-timezone",
            "Nowhere/Invalid",
        ],
    );
    assert!(wait_for_port(port, Duration::from_secs(10)), "server never listened");

    interrupt(&child);
    let status = wait_for_exit(&mut child, Duration::from_secs(15)).expect("did not exit");
    assert!(status.success(), "exit status: {}", status);

    let log = fs::read_to_string(&log_path).unwrap();
    assert!(log.contains("Server started"), "log file:\n{}", log);
    assert!(log.contains("Development server stopped"), "log file:\n{}", log);
    assert!(
        log.contains("Unknown log timezone \"Nowhere/Invalid\", using UTC"),
        "log file:\n{}",
        log
    );
    assert!(log.contains("+00:00 INFO "), "log file:\n{}", log);
    assert!(!log.contains('\x1b'), "log file has colour codes:\n{}", log);
}

/// A `serve` that cannot bind exits non-zero and logs the failure
#[test]
fn serve_bind_failure_is_logged() {
    let temp = tempdir().unwrap();
    let log_path = temp.path().join("serve.log");
    let taken = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = taken.local_addr().unwrap().port();

    let output = Command::new(env!("CARGO_BIN_EXE_reload-server"))
        .arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--log-file")
        .arg(&log_path)
        .current_dir(temp.path())
        .output()
        .expect("Failed to run reload-server serve");

    assert!(!output.status.success());
    let log = fs::read_to_string(&log_path).unwrap();
    assert!(
        log.contains(&format!("ERROR reload_server] Failed to bind 127.0.0.1:{}", port)),
        "log file:\n{}",
        log
    );
}
