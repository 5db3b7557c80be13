use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tempfile::TempDir;

fn bundled_shader() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .and_then(|p| p.parent())
        .expect("crate dir has workspace root")
        .join("shader/shader.wgsl")
}

fn quatmarch() -> Command {
    let mut command = Command::new(env!("CARGO_BIN_EXE_quatmarch"));
    command.env_remove("QUATMARCH_SHADER").env("RUST_LOG", "error");
    command
}

#[test]
fn check_accepts_the_bundled_shader() {
    let output = quatmarch()
        .arg("--check")
        .arg(bundled_shader())
        .output()
        .expect("failed to run quatmarch --check");

    assert!(
        output.status.success(),
        "stderr: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("24 of 24 bytes"), "stdout: {stdout}");
    assert!(stdout.trim_end().ends_with(": ok"), "stdout: {stdout}");
}

#[test]
fn check_rejects_a_shader_without_fs_main() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("broken.wgsl");
    fs::write(
        &path,
        r#"
@group(0) @binding(0) var<uniform> u: vec4<f32>;

@vertex
fn vs_main(@builtin(vertex_index) index: u32) -> @builtin(position) vec4<f32> {
    return vec4<f32>(f32(index), 0.0, 0.0, 1.0);
}
"#,
    )
    .unwrap();

    let output = quatmarch()
        .arg("--check")
        .arg(&path)
        .output()
        .expect("failed to run quatmarch --check");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("fs_main"), "stderr: {stderr}");
}

#[test]
fn check_reads_the_shader_from_the_environment() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("shader.wgsl");
    fs::copy(bundled_shader(), &path).unwrap();

    let status = quatmarch()
        .env("QUATMARCH_SHADER", &path)
        .arg("--check")
        .status()
        .expect("failed to run quatmarch --check");

    assert!(status.success());
}

#[test]
fn check_fails_for_a_missing_file() {
    let dir = TempDir::new().unwrap();
    let status = quatmarch()
        .arg("--check")
        .arg(dir.path().join("missing.wgsl"))
        .status()
        .expect("failed to run quatmarch --check");

    assert!(!status.success());
}

#[test]
fn invalid_size_is_a_usage_error() {
    let status = quatmarch()
        .args(["--size", "0x720", "--check"])
        .arg(bundled_shader())
        .status()
        .expect("failed to run quatmarch");

    assert_eq!(status.code(), Some(2));
}
