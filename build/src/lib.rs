use std::env;
use std::error::Error;
use std::process::Command;

use simple_error::bail;
use vergen::{BuildBuilder, CargoBuilder, Emitter, RustcBuilder};

/// Emits the vergen build metadata plus `EVENTDESK_VERSION` and
/// `EVENTDESK_TARGET` for the binaries to embed with `env!`.
pub fn run() -> Result<(), Box<dyn Error>> {
    Emitter::default()
        .add_instructions(&BuildBuilder::all_build()?)?
        .add_instructions(&CargoBuilder::all_cargo()?)?
        .add_instructions(&RustcBuilder::all_rustc()?)?
        .emit()?;

    println!("cargo:rustc-env=EVENTDESK_VERSION={}", version());
    println!(
        "cargo:rustc-env=EVENTDESK_TARGET={}",
        env::var("TARGET").unwrap_or_else(|_| String::from("unknown"))
    );
    println!("cargo:rerun-if-changed=../.git/HEAD");

    Ok(())
}

/// The nearest git tag, or the package version outside a tagged checkout.
/// Builds with local changes get a `-dirty` suffix.
fn version() -> String {
    let base = match git(&["describe", "--tags"]) {
        Ok(tag) if !tag.is_empty() => tag,
        _ => format!("v{}", env::var("CARGO_PKG_VERSION").unwrap_or_default()),
    };

    let dirty = git(&["status", "--porcelain"])
        .map(|out| out.lines().any(|line| !line.trim().is_empty()))
        .unwrap_or(false);
    if dirty {
        return format!("{base}-dirty");
    }
    base
}

fn git(args: &[&str]) -> Result<String, Box<dyn Error>> {
    let output = Command::new("git").args(args).output()?;
    if !output.status.success() {
        bail!("git {} failed", args.join(" "));
    }
    Ok(String::from_utf8(output.stdout)?.trim().to_string())
}
