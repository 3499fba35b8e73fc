// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use packsmith::{DescriptorBuilder, PackageDescriptor};
use std::fs;
use std::path::{Path, PathBuf};

/// Descriptor used by the golden-output tests: test / 0.0.1 / python
pub fn test_descriptor() -> PackageDescriptor {
    DescriptorBuilder::new()
        .id("test")
        .version("0.0.1")
        .author("python")
        .build()
        .unwrap()
}

/// Write an executable `/bin/sh` script standing in for an external tool.
#[cfg(unix)]
pub fn fake_tool(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    fs::write(&path, format!("#!/bin/sh\n{}\n", body)).unwrap();
    let mut perms = fs::metadata(&path).unwrap().permissions();
    perms.set_mode(0o755);
    fs::set_permissions(&path, perms).unwrap();
    path
}

/// A choco stand-in that packs successfully into `--outputdirectory`,
/// copying the generated sources next to the package for inspection.
pub const CHOCO_SUCCESS: &str = r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outputdirectory) out="$2"; shift ;;
  esac
  shift
done
cp ./*.nuspec "$out/" 2>/dev/null
cp tools/chocolateyInstall.ps1 "$out/" 2>/dev/null
touch "$out/test.0.0.1.nupkg"
echo "Successfully created package '$out/test.0.0.1.nupkg'""#;

/// Number of entries in a directory, 0 if it does not exist.
pub fn entry_count(dir: &Path) -> usize {
    fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}
