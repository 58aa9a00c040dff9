use std::{process::Command, time::SystemTime};

fn main() {
  let now = SystemTime::now()
    .duration_since(std::time::UNIX_EPOCH)
    .unwrap()
    .as_millis();
  println!("cargo:rustc-env=BUILD_TIME={}", now);

  // Tell Cargo to rerun this script if git state changes
  println!("cargo:rerun-if-changed=.git/HEAD");

  let commit = Command::new("git")
    .args(["rev-parse", "--short", "HEAD"])
    .output()
    .ok()
    .filter(|o| o.status.success())
    .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
    .unwrap_or_else(|| "unknown".to_string());

  println!("cargo:rustc-env=GIT_COMMIT={}", commit);
}
