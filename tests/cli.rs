use assert_cmd::prelude::*;
use predicates::str::contains;
use std::io::Write;
use std::process::Command;
use tempfile::NamedTempFile;

use gl_demos::DemoKind;

fn gl_demos() -> Command {
    Command::cargo_bin("gl-demos").expect("binary exists")
}

#[test]
fn cli_lists_every_demo() {
    gl_demos()
        .arg("--list")
        .assert()
        .success()
        .stdout(contains("flat-triangle"))
        .stdout(contains("colored-triangle"))
        .stdout(contains("textured-cube"))
        .stdout(contains("colored-cube"));
}

#[test]
fn cli_describes_a_demo_without_a_gpu() {
    gl_demos()
        .args(["colored-cube", "--describe"])
        .assert()
        .success()
        .stdout(contains("coordinates @ location 0: 3 floats at byte 0"))
        .stdout(contains("vertColor @ location 1: 3 floats at byte 12"))
        .stdout(contains("mWorld @ group 0 binding 0"))
        .stdout(contains("stride 24 bytes"))
        .stdout(contains("draw indexed (36 indices, u16)"));
}

#[test]
fn cli_dumps_a_loadable_config() {
    let output = gl_demos()
        .args(["textured-cube", "--dump-config"])
        .output()
        .expect("run gl-demos");
    assert!(output.status.success());

    let mut record = NamedTempFile::new().expect("temp record");
    record.write_all(&output.stdout).expect("write record");
    gl_demos()
        .arg("--config")
        .arg(record.path())
        .arg("--describe")
        .assert()
        .success()
        .stdout(contains(DemoKind::TexturedCube.name()))
        .stdout(contains("diffuseTexture @ group 0 binding 3"));
}

#[test]
fn cli_reports_shader_errors_from_a_config() {
    let mut config = DemoKind::ColoredTriangle.config();
    config.shaders.vertex = config.shaders.vertex.replace("return out;", "return out");
    let mut record = NamedTempFile::new().expect("temp record");
    record
        .write_all(config.to_json().expect("serialize").as_bytes())
        .expect("write record");

    gl_demos()
        .arg("--config")
        .arg(record.path())
        .arg("--describe")
        .assert()
        .failure()
        .stderr(contains("Vertex shader compilation failed"));
}

#[test]
fn cli_rejects_malformed_records() {
    let mut record = NamedTempFile::new().expect("temp record");
    record.write_all(b"{\"name\": 3}").expect("write record");
    gl_demos()
        .arg("--config")
        .arg(record.path())
        .arg("--dump-config")
        .assert()
        .failure()
        .stderr(contains("failed to load demo record"));
}

#[test]
fn cli_rejects_unknown_arguments() {
    gl_demos()
        .arg("--fullscreen")
        .assert()
        .failure()
        .stderr(contains("Unknown argument: --fullscreen"))
        .stderr(contains("Usage: gl-demos"));
}

#[test]
fn cli_rejects_unknown_demos() {
    gl_demos()
        .args(["spinning-teapot", "--describe"])
        .assert()
        .failure()
        .stderr(contains("unknown demo `spinning-teapot`"));
}
