// src/processor/mod.rs

//! Pipeline processors
//!
//! A processor is one step of a packaging pipeline. It declares the
//! variables it reads and writes, and the host hands it a [`ProcessorEnv`]
//! holding the current values. [`execute`] applies declared defaults and
//! rejects a run with missing required inputs before the processor touches
//! anything.
//!
//! Processors:
//! - [`MakeCatalogs`]: rebuild Munki catalogs after an import
//! - [`MunkiImporter`]: import an installer into a Munki repository
//! - [`ChocolateyPackager`]: build a NuGet/Chocolatey package
//! - [`SignToolVerifier`]: verify an Authenticode signature

mod chocolatey;
mod env;
mod makecatalogs;
mod munki_import;
mod signtool;

pub use chocolatey::ChocolateyPackager;
pub use env::ProcessorEnv;
pub use makecatalogs::MakeCatalogs;
pub use munki_import::MunkiImporter;
pub use signtool::SignToolVerifier;

use crate::config::Config;
use crate::error::{Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use url::Url;

/// A declared input variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputVariable {
    pub name: &'static str,
    pub required: bool,
    pub description: &'static str,
    /// JSON literal applied when the variable is absent
    pub default: Option<&'static str>,
}

impl InputVariable {
    pub const fn required(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            required: true,
            description,
            default: None,
        }
    }

    pub const fn optional(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            required: false,
            description,
            default: None,
        }
    }

    pub const fn with_default(self, default: &'static str) -> Self {
        Self {
            default: Some(default),
            ..self
        }
    }
}

/// A declared output variable
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputVariable {
    pub name: &'static str,
    pub description: &'static str,
}

impl OutputVariable {
    pub const fn new(name: &'static str, description: &'static str) -> Self {
        Self { name, description }
    }
}

/// Shared state available to every processor run
#[derive(Debug, Clone, Default)]
pub struct ProcessorContext {
    pub config: Config,
}

impl ProcessorContext {
    pub fn new(config: Config) -> Self {
        Self { config }
    }
}

/// One pipeline step
pub trait Processor {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn input_variables(&self) -> &'static [InputVariable];

    fn output_variables(&self) -> &'static [OutputVariable];

    /// Do the work. Inputs are already validated when this is called.
    fn main(&self, env: &mut ProcessorEnv, ctx: &ProcessorContext) -> Result<()>;
}

/// Validate inputs, apply defaults, then run the processor
pub fn execute(
    processor: &dyn Processor,
    env: &mut ProcessorEnv,
    ctx: &ProcessorContext,
) -> Result<()> {
    let mut missing = Vec::new();

    for var in processor.input_variables() {
        if env.is_present(var.name) {
            continue;
        }
        if let Some(default) = var.default {
            debug!("{}: defaulting {} to {}", processor.name(), var.name, default);
            env.set(var.name, serde_json::from_str(default)?);
        } else if var.required {
            missing.push(var.name);
        }
    }

    if !missing.is_empty() {
        return Err(Error::validation(format!(
            "{}: missing required input variable(s): {}",
            processor.name(),
            missing.join(", ")
        )));
    }

    info!("Running processor {}", processor.name());
    processor.main(env, ctx)
}

/// All available processors
pub fn registry() -> Vec<Box<dyn Processor>> {
    vec![
        Box::new(MakeCatalogs),
        Box::new(MunkiImporter),
        Box::new(ChocolateyPackager),
        Box::new(SignToolVerifier),
    ]
}

/// Look up a processor by its exact name
pub fn find(name: &str) -> Option<Box<dyn Processor>> {
    registry().into_iter().find(|p| p.name() == name)
}

/// Path input that must exist on disk
pub(crate) fn existing_path(env: &ProcessorEnv, name: &str) -> Result<PathBuf> {
    let path = PathBuf::from(env.required_string(name)?);
    if !path.exists() {
        return Err(Error::validation(format!(
            "{} does not exist: {}",
            name,
            path.display()
        )));
    }
    Ok(path)
}

/// Munki repository as the URL the munki tools take
///
/// URLs are passed through. Anything else is a local directory, which must
/// exist, and becomes a `file://` URL without trailing slash.
pub(crate) fn munki_repo_url(env: &ProcessorEnv, name: &str) -> Result<Option<String>> {
    let Some(repo) = env.string(name)? else {
        return Ok(None);
    };

    // One-letter schemes are Windows drive letters
    if let Ok(url) = Url::parse(&repo)
        && url.scheme().len() > 1
    {
        return Ok(Some(repo));
    }

    let path = Path::new(&repo);
    let absolute = path.canonicalize().map_err(|e| {
        Error::validation(format!("Munki repository not found: {}: {}", path.display(), e))
    })?;
    let url = Url::from_directory_path(&absolute)
        .map_err(|_| Error::validation(format!("cannot express {} as a URL", absolute.display())))?;
    Ok(Some(url.as_str().trim_end_matches('/').to_string()))
}

/// Executable override: input variable first, then configuration
pub(crate) fn program_override(
    env: &ProcessorEnv,
    input: &str,
    configured: Option<&Path>,
) -> Result<Option<PathBuf>> {
    Ok(env
        .string(input)?
        .map(PathBuf::from)
        .or_else(|| configured.map(Path::to_path_buf)))
}
