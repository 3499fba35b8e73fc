// src/processor/munki_import.rs

//! MunkiImporter: import an installer into a Munki repository

use super::{
    InputVariable, OutputVariable, Processor, ProcessorContext, ProcessorEnv, existing_path,
    munki_repo_url, program_override,
};
use crate::error::{Error, Result};
use crate::tool::{resolve_program, ToolCommand};
use serde_json::json;
use std::ffi::OsString;
use std::path::Path;
use tracing::info;

pub const DEFAULT_MUNKIIMPORT: &str = "/usr/local/munki/munkiimport";

const INPUTS: &[InputVariable] = &[
    InputVariable::required("pkg_path", "Installer to import (pkg, dmg, msi, ...)."),
    InputVariable::optional(
        "munki_repo",
        "Munki repository path or URL; munkiimport's own configuration is used when unset.",
    ),
    InputVariable::optional("munki_repo_plugin", "Munki repo plugin, e.g. FileRepo."),
    InputVariable::optional("repo_subdirectory", "Subdirectory under pkgs/ and pkgsinfo/."),
    InputVariable::optional("name", "Item name in the repository."),
    InputVariable::optional("display_name", "Display name shown to users."),
    InputVariable::optional("catalogs", "Catalogs the item is added to."),
    InputVariable::optional("munkiimport_pkgname", "Passed as --pkgname."),
    InputVariable::optional("munkiimport_appname", "Passed as --appname."),
    InputVariable::optional(
        "uninstaller_pkg_path",
        "Uninstaller package imported alongside the item.",
    ),
    InputVariable::optional("extract_icon", "Extract and import an icon from the installer.")
        .with_default("false"),
    InputVariable::optional(
        "additional_makepkginfo_options",
        "Additional makepkginfo flags passed through to munkiimport.",
    ),
    InputVariable::optional("munkiimport_path", "Explicit path to munkiimport."),
];

const OUTPUTS: &[OutputVariable] = &[
    OutputVariable::new(
        "munki_repo_changed",
        "True once an item was imported; MakeCatalogs only runs when set.",
    ),
    OutputVariable::new("pkg_repo_path", "Repo path the installer was copied to."),
    OutputVariable::new("pkginfo_repo_path", "Repo path the pkginfo was written to."),
    OutputVariable::new("munki_importer_summary_result", "What was imported."),
    OutputVariable::new("munki_import_stdout", "Standard output of munkiimport."),
];

/// Imports an installer with munkiimport
pub struct MunkiImporter;

impl MunkiImporter {
    fn build_args(env: &ProcessorEnv, pkg_path: &Path) -> Result<Vec<OsString>> {
        let mut args: Vec<OsString> = vec!["--nointeractive".into()];

        if let Some(url) = munki_repo_url(env, "munki_repo")? {
            args.push("--repo-url".into());
            args.push(url.into());
        }

        let flags = [
            ("munki_repo_plugin", "--plugin"),
            ("repo_subdirectory", "--subdirectory"),
            ("name", "--name"),
            ("display_name", "--displayname"),
            ("munkiimport_pkgname", "--pkgname"),
            ("munkiimport_appname", "--appname"),
        ];
        for (input, flag) in flags {
            if let Some(value) = env.string(input)? {
                args.push(flag.into());
                args.push(value.into());
            }
        }
        for catalog in env.string_list("catalogs")? {
            args.push("--catalog".into());
            args.push(catalog.into());
        }
        if env.is_present("uninstaller_pkg_path") {
            args.push("--uninstallpkg".into());
            args.push(existing_path(env, "uninstaller_pkg_path")?.into());
        }
        if env.bool("extract_icon")?.unwrap_or(false) {
            args.push("--extract_icon".into());
        }
        args.extend(
            env.string_list("additional_makepkginfo_options")?
                .into_iter()
                .map(OsString::from),
        );

        args.push(pkg_path.into());
        Ok(args)
    }
}

/// Repo path from munkiimport's `Copied <item> to <path>.` line
fn copied_item_path(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let rest = line.trim().strip_prefix("Copied ")?;
        let (_, path) = rest.rsplit_once(" to ")?;
        Some(path.trim_end_matches('.').to_string())
    })
}

/// Repo path from munkiimport's `Saved pkginfo to <path>.` line
fn saved_pkginfo_path(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let path = line.trim().strip_prefix("Saved pkginfo to ")?;
        Some(path.trim_end_matches('.').to_string())
    })
}

impl Processor for MunkiImporter {
    fn name(&self) -> &'static str {
        "MunkiImporter"
    }

    fn description(&self) -> &'static str {
        "Imports an installer into a Munki repository using munkiimport."
    }

    fn input_variables(&self) -> &'static [InputVariable] {
        INPUTS
    }

    fn output_variables(&self) -> &'static [OutputVariable] {
        OUTPUTS
    }

    fn main(&self, env: &mut ProcessorEnv, ctx: &ProcessorContext) -> Result<()> {
        env.remove("munki_importer_summary_result");

        let pkg_path = existing_path(env, "pkg_path")?;
        let args = Self::build_args(env, &pkg_path)?;

        let explicit = program_override(
            env,
            "munkiimport_path",
            ctx.config.tools.munkiimport.as_deref(),
        )?;
        let program = resolve_program("munkiimport", DEFAULT_MUNKIIMPORT, explicit.as_deref())?;

        let output = ToolCommand::new("munkiimport", program).args(args).run()?;
        if !output.success() {
            return Err(Error::ToolFailed {
                tool: "munkiimport".to_string(),
                code: output.code,
                stderr: output.diagnostics().to_string(),
            });
        }

        let pkg_repo_path = copied_item_path(&output.stdout).unwrap_or_default();
        let pkginfo_repo_path = saved_pkginfo_path(&output.stdout).unwrap_or_default();
        info!("Imported {} into the Munki repository", pkg_path.display());
        if !pkginfo_repo_path.is_empty() {
            info!("Copied pkginfo to {}", pkginfo_repo_path);
        }

        let summary = json!({
            "pkg_path": pkg_path.to_string_lossy(),
            "repo_subdirectory": env.string("repo_subdirectory")?,
            "catalogs": env.string_list("catalogs")?,
            "name": env.string("name")?,
            "pkg_repo_path": pkg_repo_path,
            "pkginfo_path": pkginfo_repo_path,
        });
        env.set("munki_import_stdout", json!(output.stdout.trim()));
        env.set("pkg_repo_path", json!(pkg_repo_path));
        env.set("pkginfo_repo_path", json!(pkginfo_repo_path));
        env.set("munki_repo_changed", json!(true));
        env.set("munki_importer_summary_result", summary);
        Ok(())
    }
}
