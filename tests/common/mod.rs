use std::fs;
use std::path::{Path, PathBuf};

/// Writes an executable shell script standing in for the optimizer binary.
#[cfg(unix)]
pub fn write_stub_optimizer(dir: &Path, name: &str, script: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, script).expect("write stub optimizer");
    let mut permissions = fs::metadata(&path).expect("stat stub optimizer").permissions();
    permissions.set_mode(0o755);
    fs::set_permissions(&path, permissions).expect("mark stub optimizer executable");
    path
}
