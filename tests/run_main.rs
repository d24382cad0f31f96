use std::path::PathBuf;
use std::process::Output;
use std::time::Duration;

use assert_cmd::Command;

const TIMEOUT_DURATION: Duration = Duration::from_secs(30);
const VARIANTS: &[&str] = &["triangle", "textured-quad", "lighting-ready"];
const NO_ADAPTER: &str = "Could not find a graphics adapter";

/// Renders one offscreen frame, `None` when the machine has no graphics adapter.
fn run_headless(args: &[&str]) -> Result<Option<Output>, anyhow::Error> {
    let output = Command::cargo_bin(env!("CARGO_PKG_NAME"))?
        .env("HEADLESS", "true")
        .args(args)
        .timeout(TIMEOUT_DURATION)
        .output()?;
    let stderr = String::from_utf8_lossy(&output.stderr);
    if !output.status.success() && stderr.contains(NO_ADAPTER) {
        eprintln!("skipped, no graphics adapter: {args:?}");
        return Ok(None);
    }
    assert!(
        output.status.success(),
        "{args:?} failed with {}\n{stderr}",
        output.status
    );
    Ok(Some(output))
}

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "freefly-playground-{}-{name}",
        std::process::id()
    ))
}

#[test]
fn every_variant_renders_a_headless_frame() -> Result<(), anyhow::Error> {
    for variant in VARIANTS {
        run_headless(&["--variant", variant])?;
    }
    Ok(())
}

#[test]
fn invalid_shader_falls_back_to_builtin() -> Result<(), anyhow::Error> {
    let path = scratch_file("broken.wgsl");
    std::fs::write(&path, "this is not wgsl")?;
    let shader = path.to_string_lossy().into_owned();
    let outputs: Vec<_> = ["triangle", "lighting-ready"]
        .into_iter()
        .map(|variant| run_headless(&["--variant", variant, "--shader", &shader]))
        .collect();
    std::fs::remove_file(&path)?;
    for output in outputs {
        if let Some(output) = output? {
            let stdout = String::from_utf8_lossy(&output.stdout);
            assert!(stdout.contains("Shader override rejected"), "{stdout}");
        }
    }
    Ok(())
}

#[test]
fn shader_with_mismatched_bindings_falls_back_to_builtin() -> Result<(), anyhow::Error> {
    let path = scratch_file("unbound.wgsl");
    // Valid WGSL reading a binding the triangle pipeline never provides.
    std::fs::write(
        &path,
        "@group(3) @binding(7) var<uniform> tint: vec4<f32>;\n\
         @vertex fn vtx_main(@location(0) p: vec3<f32>) -> @builtin(position) vec4<f32> {\n\
             return vec4<f32>(p, 1.0);\n\
         }\n\
         @fragment fn frg_main() -> @location(0) vec4<f32> {\n\
             return tint;\n\
         }\n",
    )?;
    let shader = path.to_string_lossy().into_owned();
    let output = run_headless(&["--variant", "triangle", "--shader", &shader]);
    std::fs::remove_file(&path)?;
    if let Some(output) = output? {
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Shader override rejected"), "{stdout}");
    }
    Ok(())
}

#[test]
fn oversized_texture_falls_back_to_placeholder() -> Result<(), anyhow::Error> {
    let path = scratch_file("wide.png");
    image::RgbaImage::new(40000, 1).save(&path)?;
    let texture = path.to_string_lossy().into_owned();
    let output = run_headless(&["--variant", "textured-quad", "--texture", &texture]);
    std::fs::remove_file(&path)?;
    if let Some(output) = output? {
        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(stdout.contains("Texture failed to load"), "{stdout}");
    }
    Ok(())
}

#[test]
fn rejects_unknown_variant() -> Result<(), anyhow::Error> {
    Command::cargo_bin(env!("CARGO_PKG_NAME"))?
        .args(["--variant", "teapot"])
        .timeout(TIMEOUT_DURATION)
        .assert()
        .failure();
    Ok(())
}

#[test]
fn prints_help() -> Result<(), anyhow::Error> {
    Command::cargo_bin(env!("CARGO_PKG_NAME"))?
        .arg("--help")
        .timeout(TIMEOUT_DURATION)
        .assert()
        .success();
    Ok(())
}
