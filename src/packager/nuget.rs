// src/packager/nuget.rs
//! NuGet backend: `nuget pack <nuspec> -OutputDirectory <dir> -NonInteractive`

use super::PackagerBackend;
use std::ffi::OsString;
use std::path::Path;

/// Packs with nuget.exe; plain NuGet packages carry no install script
pub struct NuGetBackend;

impl PackagerBackend for NuGetBackend {
    fn name(&self) -> &'static str {
        "nuget"
    }

    fn default_program(&self) -> &'static str {
        "nuget"
    }

    fn accepts_install_script(&self) -> bool {
        false
    }

    fn pack_args(&self, descriptor: &Path, output_dir: &Path) -> Vec<OsString> {
        vec![
            "pack".into(),
            descriptor.into(),
            "-OutputDirectory".into(),
            output_dir.into(),
            "-NonInteractive".into(),
        ]
    }
}
