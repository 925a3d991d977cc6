use std::process::Command;

fn main() {
    // Set build date
    let now = chrono::Utc::now()
        .format("%Y-%m-%d %H:%M:%S UTC")
        .to_string();
    println!("cargo:rustc-env=BUILD_DATE={}", now);

    // Set git commit hash if available
    let commit = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .map(|output| String::from_utf8_lossy(&output.stdout).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    println!("cargo:rustc-env=GIT_COMMIT={}", commit);

    // Generated bindings depend on the protocol XML
    println!("cargo:rerun-if-changed=protocols/tizen-extension.xml");
    println!("cargo:rerun-if-changed=protocols/xdg-shell-unstable-v6.xml");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
