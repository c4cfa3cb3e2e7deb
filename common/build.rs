// Tags the crate version with the short commit hash as BUILD_VERSION

use std::process::Command;

fn main() {
    let commit_hash = match option_env!("TICKWIRE_COMMIT_HASH") {
        Some(hash) => hash.chars().take(7).collect(),
        None => match Command::new("git")
            .args(["rev-parse", "--short", "HEAD"])
            .output()
        {
            Ok(output) if output.status.success() => {
                String::from_utf8_lossy(&output.stdout).trim().to_string()
            }
            // Not a git checkout, or git is missing
            _ => "unknown".to_string(),
        },
    };

    let build_version = format!("{}-{}", env!("CARGO_PKG_VERSION"), commit_hash);
    println!("cargo:rerun-if-env-changed=TICKWIRE_COMMIT_HASH");
    println!("cargo:rustc-env=BUILD_VERSION={build_version}");
}
