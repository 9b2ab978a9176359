//! Stamps the `--version` string at build time.
//!
//! A build on a release tag reports the crate version. Anything else reports
//! `dev@<short hash>`, with `-dirty` appended when tracked files have local
//! changes, or `dev@unknown` outside a git checkout.

use std::process::Command;

fn git(args: &[&str]) -> Option<String> {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
}

fn main() {
    println!("cargo:rerun-if-changed=.git/HEAD");
    println!("cargo:rerun-if-changed=.git/refs/");
    println!("cargo:rerun-if-changed=.git/index");

    let release = git(&["describe", "--exact-match", "--tags", "HEAD"]).is_some();
    let version = if release {
        std::env::var("CARGO_PKG_VERSION").unwrap_or_default()
    } else {
        match git(&["rev-parse", "--short", "HEAD"]).filter(|h| !h.is_empty()) {
            Some(hash) => {
                let dirty = git(&["status", "--porcelain", "--untracked-files=no"])
                    .is_some_and(|changes| !changes.is_empty());
                if dirty {
                    format!("dev@{hash}-dirty")
                } else {
                    format!("dev@{hash}")
                }
            }
            None => "dev@unknown".to_string(),
        }
    };

    println!("cargo:rustc-env=PORTFOLIO_R2_VERSION={version}");
}
