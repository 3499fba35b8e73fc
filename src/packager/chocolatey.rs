// src/packager/chocolatey.rs
//! Chocolatey backend: `choco pack <nuspec> --outputdirectory <dir>`

use super::PackagerBackend;
use std::ffi::OsString;
use std::path::Path;

/// Packs with choco.exe; install scripts are included from `tools/`
pub struct ChocolateyBackend;

impl PackagerBackend for ChocolateyBackend {
    fn name(&self) -> &'static str {
        "choco"
    }

    fn default_program(&self) -> &'static str {
        "choco"
    }

    fn accepts_install_script(&self) -> bool {
        true
    }

    fn pack_args(&self, descriptor: &Path, output_dir: &Path) -> Vec<OsString> {
        vec![
            "pack".into(),
            descriptor.into(),
            "--outputdirectory".into(),
            output_dir.into(),
        ]
    }
}
