// src/packager/mod.rs
//! Package assembly
//!
//! The packager writes a descriptor (and optionally an install script) into a
//! scratch directory and hands it to a backend executable:
//!
//! ```text
//! <scratch>/
//!   <id>.nuspec
//!   tools/chocolateyInstall.ps1   (Chocolatey only)
//! ```
//!
//! The scratch directory is removed on every exit path unless the caller asks
//! to preserve it.

pub mod chocolatey;
pub mod nuget;

pub use chocolatey::ChocolateyBackend;
pub use nuget::NuGetBackend;

use crate::error::{Error, Result};
use crate::nuget::install_script::SCRIPT_PATH;
use crate::nuget::{InstallScriptSpec, PackageDescriptor};
use crate::tool::{resolve_program, ToolCommand};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use strum_macros::{Display, EnumString};
use tempfile::TempDir;
use tracing::{debug, info, warn};

/// Marker both nuget and choco print before the artifact path
const CREATED_MARKER: &str = "Successfully created package '";

/// A packaging executable and its calling convention
pub trait PackagerBackend {
    /// Name used in logs and errors
    fn name(&self) -> &'static str;

    /// Program looked up on `PATH` when no explicit path is configured
    fn default_program(&self) -> &'static str;

    /// Whether the backend consumes an install script
    fn accepts_install_script(&self) -> bool;

    /// Arguments for packing `descriptor` into `output_dir`
    fn pack_args(&self, descriptor: &Path, output_dir: &Path) -> Vec<OsString>;
}

/// Backends selectable by name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum BackendKind {
    #[default]
    Chocolatey,
    NuGet,
}

impl BackendKind {
    pub fn backend(self) -> Box<dyn PackagerBackend> {
        match self {
            Self::Chocolatey => Box::new(ChocolateyBackend),
            Self::NuGet => Box::new(NuGetBackend),
        }
    }
}

/// Result of a successful pack
#[derive(Debug, Clone)]
pub struct PackOutcome {
    /// Path of the `.nupkg` produced
    pub package_path: PathBuf,
    /// Scratch directory, only set when it was preserved
    pub workdir: Option<PathBuf>,
}

/// Assembles packages with one backend
pub struct Packager {
    backend: Box<dyn PackagerBackend>,
    program: Option<PathBuf>,
    preserve_workdir: bool,
    scratch_root: Option<PathBuf>,
}

impl Packager {
    pub fn new(backend: Box<dyn PackagerBackend>) -> Self {
        Self {
            backend,
            program: None,
            preserve_workdir: false,
            scratch_root: None,
        }
    }

    /// Use an explicit executable instead of a `PATH` lookup
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = Some(program.into());
        self
    }

    /// Keep the scratch directory after packing, whatever the outcome
    pub fn preserve_workdir(mut self, preserve: bool) -> Self {
        self.preserve_workdir = preserve;
        self
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    /// Write the package sources and run the backend against them
    pub fn pack(
        &self,
        descriptor: &PackageDescriptor,
        script: Option<&InstallScriptSpec>,
        output_dir: &Path,
    ) -> Result<PackOutcome> {
        let name = self.backend.name();
        let program = resolve_program(
            name,
            self.backend.default_program(),
            self.program.as_deref(),
        )?;

        let workdir = match &self.scratch_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                TempDir::with_prefix_in("packsmith-", root)?
            }
            None => TempDir::with_prefix("packsmith-")?,
        };
        debug!("Scratch directory: {}", workdir.path().display());

        let result = self.pack_in(&program, workdir.path(), descriptor, script, output_dir);

        if self.preserve_workdir {
            let kept = workdir.keep();
            info!("Preserved scratch directory {}", kept.display());
            return result.map(|package_path| PackOutcome {
                package_path,
                workdir: Some(kept),
            });
        }

        result.map(|package_path| PackOutcome {
            package_path,
            workdir: None,
        })
    }

    fn pack_in(
        &self,
        program: &Path,
        workdir: &Path,
        descriptor: &PackageDescriptor,
        script: Option<&InstallScriptSpec>,
        output_dir: &Path,
    ) -> Result<PathBuf> {
        let name = self.backend.name();

        let descriptor_path = workdir.join(descriptor.file_name());
        fs::write(&descriptor_path, descriptor.to_nuspec())?;

        if let Some(script) = script {
            if self.backend.accepts_install_script() {
                let script_path = workdir.join(SCRIPT_PATH);
                if let Some(parent) = script_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&script_path, script.render())?;
            } else {
                warn!("{} does not use install scripts, skipping {}", name, SCRIPT_PATH);
            }
        }

        fs::create_dir_all(output_dir)?;
        let output_dir = output_dir.canonicalize()?;

        info!(
            "Packing {} {} with {}",
            descriptor.id(),
            descriptor.version(),
            name
        );
        let output = ToolCommand::new(name, program)
            .args(self.backend.pack_args(&descriptor_path, &output_dir))
            .current_dir(workdir)
            .run()?;

        if !output.success() {
            return Err(Error::Packaging {
                tool: name.to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        let package_path = reported_package_path(&output.stdout)
            .unwrap_or_else(|| output_dir.join(descriptor.package_file_name()));
        if !package_path.is_file() {
            return Err(Error::MissingArtifact(package_path));
        }

        info!("Created package {}", package_path.display());
        Ok(package_path)
    }
}

/// Extract the artifact path from a `Successfully created package '...'` line
fn reported_package_path(stdout: &str) -> Option<PathBuf> {
    stdout.lines().find_map(|line| {
        let start = line.find(CREATED_MARKER)? + CREATED_MARKER.len();
        let rest = &line[start..];
        let end = rest.rfind('\'')?;
        Some(PathBuf::from(&rest[..end]))
    })
}
