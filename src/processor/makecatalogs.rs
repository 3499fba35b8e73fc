// src/processor/makecatalogs.rs

//! MakeCatalogs: rebuild Munki catalogs

use super::{
    InputVariable, OutputVariable, Processor, ProcessorContext, ProcessorEnv, munki_repo_url,
    program_override,
};
use crate::error::{Error, Result};
use crate::tool::{resolve_program, ToolCommand};
use serde_json::json;
use tracing::info;

/// Where Munki installs its command-line tools
pub const DEFAULT_MAKECATALOGS: &str = "/usr/local/munki/makecatalogs";

const INPUTS: &[InputVariable] = &[
    InputVariable::required("munki_repo", "Munki repository path or URL."),
    InputVariable::optional("munki_repo_plugin", "Munki repo plugin, e.g. FileRepo."),
    InputVariable::optional(
        "munki_repo_changed",
        "Set by MunkiImporter; catalogs are only rebuilt when true.",
    ),
    InputVariable::optional(
        "force_rebuild",
        "Rebuild catalogs even when the repository is unchanged.",
    )
    .with_default("false"),
    InputVariable::optional("makecatalogs_path", "Explicit path to makecatalogs."),
];

const OUTPUTS: &[OutputVariable] = &[
    OutputVariable::new("makecatalogs_resultcode", "Exit code of makecatalogs."),
    OutputVariable::new("makecatalogs_stderr", "Error output of makecatalogs."),
    OutputVariable::new("makecatalogs_warnings", "WARNING lines reported by makecatalogs."),
];

/// Runs makecatalogs when an earlier step changed the repository
pub struct MakeCatalogs;

impl Processor for MakeCatalogs {
    fn name(&self) -> &'static str {
        "MakeCatalogs"
    }

    fn description(&self) -> &'static str {
        "Rebuilds the catalogs of a Munki repository."
    }

    fn input_variables(&self) -> &'static [InputVariable] {
        INPUTS
    }

    fn output_variables(&self) -> &'static [OutputVariable] {
        OUTPUTS
    }

    fn main(&self, env: &mut ProcessorEnv, ctx: &ProcessorContext) -> Result<()> {
        let force = env.bool("force_rebuild")?.unwrap_or(false);
        let changed = env.bool("munki_repo_changed")?.unwrap_or(false);

        if !changed && !force {
            info!("Skipping makecatalogs because repo is unchanged");
            return Ok(());
        }

        let repo_url = munki_repo_url(env, "munki_repo")?
            .ok_or_else(|| Error::validation("missing required input variable: munki_repo"))?;

        let explicit = program_override(
            env,
            "makecatalogs_path",
            ctx.config.tools.makecatalogs.as_deref(),
        )?;
        let program = resolve_program("makecatalogs", DEFAULT_MAKECATALOGS, explicit.as_deref())?;

        let mut command =
            ToolCommand::new("makecatalogs", program).args(["--repo_url", repo_url.as_str()]);
        if let Some(plugin) = env.string("munki_repo_plugin")? {
            command = command.args(["--plugin", plugin.as_str()]);
        }
        let output = command.run()?;

        let warnings: Vec<&str> = output
            .stderr
            .lines()
            .map(str::trim)
            .filter(|line| line.starts_with("WARNING:"))
            .collect();

        env.set("makecatalogs_resultcode", json!(output.code.unwrap_or(-1)));
        env.set("makecatalogs_stderr", json!(output.stderr.trim()));
        env.set("makecatalogs_warnings", json!(warnings));

        if !output.success() {
            return Err(Error::ToolFailed {
                tool: "makecatalogs".to_string(),
                code: output.code,
                stderr: output.stderr.trim().to_string(),
            });
        }

        info!(
            "Munki catalogs rebuilt in {} ({} warnings)",
            repo_url,
            warnings.len()
        );
        Ok(())
    }
}
