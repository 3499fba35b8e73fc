// src/processor/signtool.rs

//! SignToolVerifier: check an Authenticode signature with signtool

use super::{
    InputVariable, OutputVariable, Processor, ProcessorContext, ProcessorEnv, existing_path,
    program_override,
};
use crate::error::{Error, Result};
use crate::tool::{resolve_program, ToolCommand};
use serde_json::json;
use tracing::info;

const INPUTS: &[InputVariable] = &[
    InputVariable::optional(
        "disable_code_signature_verification",
        "Skip verification entirely for this run.",
    )
    .with_default("false"),
    InputVariable::required("input_path", "Signed file to verify (exe, msi, dll, ...)."),
    InputVariable::optional("signtool_path", "Explicit path to signtool.exe."),
    InputVariable::optional(
        "additional_arguments",
        "Arguments appended after 'signtool verify /pa'.",
    ),
];

const OUTPUTS: &[OutputVariable] = &[
    OutputVariable::new("signtool_verified", "True once the signature checked out."),
    OutputVariable::new("signtool_stdout", "Standard output of signtool."),
];

/// Fails the pipeline unless signtool accepts the file's signature
pub struct SignToolVerifier;

impl Processor for SignToolVerifier {
    fn name(&self) -> &'static str {
        "SignToolVerifier"
    }

    fn description(&self) -> &'static str {
        "Verifies the Authenticode signature of a file with signtool."
    }

    fn input_variables(&self) -> &'static [InputVariable] {
        INPUTS
    }

    fn output_variables(&self) -> &'static [OutputVariable] {
        OUTPUTS
    }

    fn main(&self, env: &mut ProcessorEnv, ctx: &ProcessorContext) -> Result<()> {
        if env.bool("disable_code_signature_verification")?.unwrap_or(false) {
            info!("Code signature verification disabled for this run");
            return Ok(());
        }

        let input_path = existing_path(env, "input_path")?;
        let additional = env.string_list("additional_arguments")?;

        let explicit =
            program_override(env, "signtool_path", ctx.config.tools.signtool.as_deref())?;
        let program = resolve_program("signtool", "signtool", explicit.as_deref())?;

        let output = ToolCommand::new("signtool", program)
            .args(["verify", "/pa"])
            .args(&additional)
            .arg(&input_path)
            .run()?;

        env.set("signtool_stdout", json!(output.stdout.trim()));
        if !output.success() {
            env.set("signtool_verified", json!(false));
            return Err(Error::SignatureInvalid {
                path: input_path,
                detail: output.diagnostics().to_string(),
            });
        }

        info!("Signature verified for {}", input_path.display());
        env.set("signtool_verified", json!(true));
        Ok(())
    }
}
