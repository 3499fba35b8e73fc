// src/nuget/mod.rs
//! NuGet package model
//!
//! - [`PackageDescriptor`]: validated metadata, serialized to `.nuspec`
//! - [`InstallScriptSpec`]: Chocolatey install arguments, rendered to
//!   `chocolateyInstall.ps1`

pub mod descriptor;
pub mod install_script;

pub use descriptor::{Dependency, DescriptorBuilder, License, LicenseKind, PackageDescriptor};
pub use install_script::{InstallScriptSpec, ScriptValue};
