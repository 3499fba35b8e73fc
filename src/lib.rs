// src/lib.rs

//! Packsmith: packaging pipeline processors
//!
//! Each processor performs one step of a software-packaging pipeline by
//! driving an external tool:
//!
//! - `MakeCatalogs`: rebuild Munki catalogs (makecatalogs)
//! - `MunkiImporter`: import an installer into Munki (munkiimport)
//! - `ChocolateyPackager`: build a NuGet/Chocolatey package (choco, nuget)
//! - `SignToolVerifier`: verify an Authenticode signature (signtool)
//!
//! # Architecture
//!
//! - `nuget`: package descriptor model and install-script generator
//! - `packager`: scratch directory assembly and backend invocation
//! - `tool`: executable lookup and synchronous process execution
//! - `processor`: declared inputs/outputs, variable environment, registry

pub mod config;
mod error;
pub mod nuget;
pub mod packager;
pub mod processor;
pub mod tool;

pub use config::Config;
pub use error::{Error, Result};
pub use nuget::{
    Dependency, DescriptorBuilder, InstallScriptSpec, License, LicenseKind, PackageDescriptor,
    ScriptValue,
};
pub use packager::{BackendKind, ChocolateyBackend, NuGetBackend, PackOutcome, Packager, PackagerBackend};
pub use processor::{
    execute, InputVariable, OutputVariable, Processor, ProcessorContext, ProcessorEnv,
};
