// src/processor/chocolatey.rs

//! ChocolateyPackager: build a NuGet/Chocolatey package
//!
//! Collects the package metadata and installer arguments from the
//! environment, then hands them to the [`Packager`] with the selected
//! backend. The install script is only generated when an installer URL is
//! known; without one the result is a metadata-only package.

use super::{
    InputVariable, OutputVariable, Processor, ProcessorContext, ProcessorEnv, program_override,
};
use crate::error::{Error, Result};
use crate::nuget::{
    Dependency, DescriptorBuilder, InstallScriptSpec, License, LicenseKind, PackageDescriptor,
};
use crate::packager::{BackendKind, Packager};
use serde_json::{json, Value};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

const INPUTS: &[InputVariable] = &[
    InputVariable::required("id", "Package id."),
    InputVariable::required("version", "Package version."),
    InputVariable::optional("authors", "Software authors (one of authors/owners is required)."),
    InputVariable::optional("owners", "Package owners (one of authors/owners is required)."),
    InputVariable::optional("title", "Human-friendly title."),
    InputVariable::optional("description", "Package description."),
    InputVariable::optional("summary", "Short description."),
    InputVariable::optional("project_url", "Project home page."),
    InputVariable::optional("license_url", "License location."),
    InputVariable::optional("icon_url", "Icon location."),
    InputVariable::optional("tags", "Tags, as a list or space/comma separated."),
    InputVariable::optional("release_notes", "Release notes."),
    InputVariable::optional("copyright", "Copyright notice."),
    InputVariable::optional("require_license_acceptance", "Prompt for license acceptance."),
    InputVariable::optional("icon", "Icon file inside the package."),
    InputVariable::optional("license", "License expression, or license file inside the package."),
    InputVariable::optional("license_type", "How 'license' is read: expression or file.")
        .with_default(r#""expression""#),
    InputVariable::optional(
        "dependencies",
        "Dependencies as {id, version} tables or 'id[:version]' strings.",
    ),
    InputVariable::optional("installer_type", "Installer file type (exe, msi, ...)."),
    InputVariable::optional("installer_url", "32-bit installer URL."),
    InputVariable::optional("installer_url64", "64-bit installer URL."),
    InputVariable::optional("silent_args", "Arguments for a silent install."),
    InputVariable::optional("valid_exit_codes", "Exit codes treated as success."),
    InputVariable::optional("installer_checksum", "Checksum of the 32-bit installer."),
    InputVariable::optional("installer_checksum_type", "Algorithm of installer_checksum."),
    InputVariable::optional("installer_checksum64", "Checksum of the 64-bit installer."),
    InputVariable::optional("installer_checksum_type64", "Algorithm of installer_checksum64."),
    InputVariable::optional(
        "installer_path",
        "Local copy of the installer, hashed when no checksum is given.",
    ),
    InputVariable::optional(
        "installer_path64",
        "Local copy of the 64-bit installer, hashed when no checksum64 is given.",
    ),
    InputVariable::required("output_directory", "Directory receiving the .nupkg."),
    InputVariable::optional("packager_backend", "chocolatey or nuget.")
        .with_default(r#""chocolatey""#),
    InputVariable::optional("packager_path", "Explicit path to choco/nuget."),
    InputVariable::optional("keep_workdir", "Keep the scratch directory for inspection."),
];

const OUTPUTS: &[OutputVariable] = &[
    OutputVariable::new("chocolatey_package_path", "Path of the built .nupkg."),
    OutputVariable::new("chocolatey_packager_summary_result", "Summary of the build."),
    OutputVariable::new("chocolatey_workdir", "Scratch directory, when kept."),
];

/// Builds a package with choco or nuget
pub struct ChocolateyPackager;

impl ChocolateyPackager {
    fn descriptor(env: &ProcessorEnv) -> Result<PackageDescriptor> {
        let mut builder = DescriptorBuilder::new()
            .id(&env.required_string("id")?)
            .version(&env.required_string("version")?)
            .authors(env.string_list("authors")?)
            .owners(env.string_list("owners")?)
            .tags(tags(env)?);

        let optional: [(&str, fn(DescriptorBuilder, &str) -> DescriptorBuilder); 9] = [
            ("title", DescriptorBuilder::title),
            ("description", DescriptorBuilder::description),
            ("summary", DescriptorBuilder::summary),
            ("project_url", DescriptorBuilder::project_url),
            ("license_url", DescriptorBuilder::license_url),
            ("icon_url", DescriptorBuilder::icon_url),
            ("release_notes", DescriptorBuilder::release_notes),
            ("copyright", DescriptorBuilder::copyright),
            ("icon", DescriptorBuilder::icon),
        ];
        for (name, setter) in optional {
            if let Some(value) = env.string(name)? {
                builder = setter(builder, &value);
            }
        }

        if let Some(license) = env.string("license")? {
            let kind = match env.string("license_type")? {
                Some(kind) => LicenseKind::from_str(&kind)
                    .map_err(|_| Error::invalid_input("license_type", "'expression' or 'file'"))?,
                None => LicenseKind::default(),
            };
            builder = builder.license(License { kind, value: license });
        }
        if let Some(required) = env.bool("require_license_acceptance")? {
            builder = builder.require_license_acceptance(required);
        }
        for dependency in dependencies(env)? {
            builder = builder.dependency(dependency);
        }

        builder.build()
    }

    fn install_script(env: &ProcessorEnv, package_id: &str) -> Result<Option<InstallScriptSpec>> {
        let url = env.string("installer_url")?;
        let url64 = env.string("installer_url64")?;
        if url.is_none() && url64.is_none() {
            debug!("No installer URL, building a package without install script");
            return Ok(None);
        }

        // A single local installer belongs to whichever URL is present;
        // with both URLs it is the 32-bit one.
        let mut checksum = checksum_pair(env, "installer_checksum", "installer_checksum_type")?;
        let mut checksum64 =
            checksum_pair(env, "installer_checksum64", "installer_checksum_type64")?;
        if checksum.is_none() && url.is_some() {
            checksum = hashed(env, "installer_path")?;
        }
        if checksum64.is_none() && url64.is_some() {
            checksum64 = match hashed(env, "installer_path64")? {
                Some(pair) => Some(pair),
                None if url.is_none() => hashed(env, "installer_path")?,
                None => None,
            };
        }

        let mut script = InstallScriptSpec::new(package_id)
            .file_type(&env.string("installer_type")?.unwrap_or_default())
            .url(&url.unwrap_or_default())
            .url64(&url64.unwrap_or_default())
            .silent_args(&env.string("silent_args")?.unwrap_or_default())
            .valid_exit_codes(env.int_list("valid_exit_codes")?);

        if let Some((value, algorithm)) = checksum {
            script = script.checksum(&value, &algorithm);
        }
        if let Some((value, algorithm)) = checksum64 {
            script = script.checksum64(&value, &algorithm);
        }

        Ok(Some(script))
    }
}

impl Processor for ChocolateyPackager {
    fn name(&self) -> &'static str {
        "ChocolateyPackager"
    }

    fn description(&self) -> &'static str {
        "Builds a NuGet or Chocolatey package from metadata and installer arguments."
    }

    fn input_variables(&self) -> &'static [InputVariable] {
        INPUTS
    }

    fn output_variables(&self) -> &'static [OutputVariable] {
        OUTPUTS
    }

    fn main(&self, env: &mut ProcessorEnv, ctx: &ProcessorContext) -> Result<()> {
        let descriptor = Self::descriptor(env)?;
        let script = Self::install_script(env, descriptor.id())?;

        let backend_name = env.string("packager_backend")?.unwrap_or_default();
        let kind = BackendKind::from_str(&backend_name)
            .map_err(|_| Error::invalid_input("packager_backend", "'chocolatey' or 'nuget'"))?;

        let tools = &ctx.config.tools;
        let configured = match kind {
            BackendKind::Chocolatey => tools.choco.as_deref(),
            BackendKind::NuGet => tools.nuget.as_deref(),
        };
        let keep_workdir = env
            .bool("keep_workdir")?
            .unwrap_or(ctx.config.packaging.keep_workdir);

        let mut packager = Packager::new(kind.backend()).preserve_workdir(keep_workdir);
        if let Some(program) = program_override(env, "packager_path", configured)? {
            packager = packager.with_program(program);
        }
        if let Some(root) = &ctx.config.packaging.scratch_root {
            packager = packager.scratch_root(root);
        }

        let output_dir = PathBuf::from(env.required_string("output_directory")?);
        let outcome = packager.pack(&descriptor, script.as_ref(), &output_dir)?;

        info!(
            "Built {} {} at {}",
            descriptor.id(),
            descriptor.version(),
            outcome.package_path.display()
        );

        let package_path = outcome.package_path.to_string_lossy().into_owned();
        env.set("chocolatey_package_path", json!(package_path));
        env.set(
            "chocolatey_packager_summary_result",
            json!({
                "id": descriptor.id(),
                "version": descriptor.version(),
                "backend": kind.to_string(),
                "package_path": package_path,
                "install_script": script.is_some(),
            }),
        );
        if let Some(workdir) = outcome.workdir {
            env.set("chocolatey_workdir", json!(workdir.to_string_lossy()));
        }
        Ok(())
    }
}

/// Tags as a list, or one string split on commas and whitespace
fn tags(env: &ProcessorEnv) -> Result<Vec<String>> {
    match env.get("tags") {
        Some(Value::String(s)) => Ok(s
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .collect()),
        _ => env.string_list("tags"),
    }
}

fn dependencies(env: &ProcessorEnv) -> Result<Vec<Dependency>> {
    let invalid = || Error::invalid_input("dependencies", "{id, version} tables or 'id[:version]' strings");

    match env.get("dependencies") {
        Some(Value::Array(items)) if items.iter().all(Value::is_object) => env
            .table_list("dependencies")?
            .iter()
            .map(|table| {
                let id = table.get("id").and_then(Value::as_str).ok_or_else(invalid)?;
                let version = table.get("version").and_then(Value::as_str);
                Dependency::parse(id)
                    .map(|dep| Dependency::new(&dep.id, version.filter(|v| !v.is_empty())))
                    .ok_or_else(invalid)
            })
            .collect(),
        _ => env
            .string_list("dependencies")?
            .iter()
            .map(|spec| Dependency::parse(spec).ok_or_else(invalid))
            .collect(),
    }
}

/// Explicit checksum and its algorithm
fn checksum_pair(env: &ProcessorEnv, value: &str, kind: &str) -> Result<Option<(String, String)>> {
    let Some(checksum) = env.string(value)? else {
        return Ok(None);
    };
    Ok(Some((checksum, env.string(kind)?.unwrap_or_default())))
}

/// SHA-256 of the file named by `input`, if set
fn hashed(env: &ProcessorEnv, input: &str) -> Result<Option<(String, String)>> {
    match env.string(input)? {
        Some(path) => Ok(Some((sha256_file(Path::new(&path))?, "sha256".to_string()))),
        None => Ok(None),
    }
}

fn sha256_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| {
        Error::validation(format!("cannot read installer {}: {}", path.display(), e))
    })?;
    let mut hasher = Sha256::new();
    std::io::copy(&mut file, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::nuget::ScriptValue;
    use crate::processor::execute;

    fn base_env() -> ProcessorEnv {
        let mut env = ProcessorEnv::new();
        env.set("id", json!("test"));
        env.set("version", json!("0.0.1"));
        env.set("authors", json!("python"));
        env
    }

    #[test]
    fn test_descriptor_from_env() {
        let mut env = base_env();
        env.set("title", json!("Test Package"));
        env.set("tags", json!("admin, tools utility"));
        env.set("require_license_acceptance", json!("false"));
        env.set(
            "dependencies",
            json!([{"id": "chocolatey-core.extension", "version": "1.3.3"}, {"id": "git"}]),
        );

        let descriptor = ChocolateyPackager::descriptor(&env).unwrap();
        assert_eq!(descriptor.id(), "test");
        assert_eq!(descriptor.title(), Some("Test Package"));
        assert_eq!(descriptor.tags(), ["admin", "tools", "utility"]);
        assert_eq!(
            descriptor.dependencies(),
            [
                Dependency::new("chocolatey-core.extension", Some("1.3.3")),
                Dependency::new("git", None),
            ]
        );
        assert!(descriptor.to_nuspec().contains("<requireLicenseAcceptance>false"));
    }

    #[test]
    fn test_minimal_descriptor_matches_golden() {
        let descriptor = ChocolateyPackager::descriptor(&base_env()).unwrap();
        assert_eq!(
            descriptor.to_nuspec(),
            "<package \
             xmlns:mstns=\"http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd\" \
             xmlns:None=\"http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd\" >\n\
             \x20   <metadata>\n\
             \x20       <id>test</id>\n\
             \x20       <version>0.0.1</version>\n\
             \x20       <authors>python</authors>\n\
             \x20   </metadata>\n\
             </package>\n"
        );
    }

    #[test]
    fn test_string_dependencies() {
        let mut env = base_env();
        env.set("dependencies", json!("dotnetfx:4.8, vcredist140"));
        let deps = dependencies(&env).unwrap();
        assert_eq!(
            deps,
            vec![
                Dependency::new("dotnetfx", Some("4.8")),
                Dependency::new("vcredist140", None)
            ]
        );

        env.set("dependencies", json!([{"version": "1.0"}]));
        assert!(dependencies(&env).is_err());
    }

    #[test]
    fn test_descriptor_requires_authors_or_owners() {
        let mut env = base_env();
        env.remove("authors");
        assert!(matches!(
            ChocolateyPackager::descriptor(&env).unwrap_err(),
            Error::Validation(_)
        ));
        env.set("owners", json!(["it-packaging"]));
        assert!(ChocolateyPackager::descriptor(&env).is_ok());
    }

    #[test]
    fn test_no_script_without_url() {
        let mut env = base_env();
        env.set("silent_args", json!("/S"));
        assert!(ChocolateyPackager::install_script(&env, "test").unwrap().is_none());
    }

    #[test]
    fn test_install_script_from_env() {
        let mut env = base_env();
        env.set("installer_type", json!("msi"));
        env.set("installer_url", json!("https://example.com/setup.msi"));
        env.set("silent_args", json!("/qn /norestart"));
        env.set("valid_exit_codes", json!([0, 3010, 1641]));
        env.set("installer_checksum", json!("ABC"));
        env.set("installer_checksum_type", json!("sha256"));

        let script = ChocolateyPackager::install_script(&env, "test").unwrap().unwrap();
        let expected = "$packageArgs = @{
  packageName = 'test'
  fileType = 'msi'
  url = 'https://example.com/setup.msi'
  silentArgs = '/qn /norestart'
  validExitCodes = @(0,3010,1641)
  checksum = 'ABC'
  checksumType = 'sha256'
}

Install-ChocolateyPackage @packageArgs
";
        assert_eq!(script.render(), expected);
    }

    const HELLO_SHA256: &str = "a948904f2f0f479b8f8197694b30184b0d2ed1c1cd2a1ec0fb85d299a192a447";

    fn str_value(value: &str) -> ScriptValue {
        ScriptValue::Str(value.to_string())
    }

    #[test]
    fn test_checksum_computed_for_32bit_installer() {
        let temp_dir = tempfile::tempdir().unwrap();
        let installer = temp_dir.path().join("setup.exe");
        std::fs::write(&installer, b"hello world\n").unwrap();

        let mut env = base_env();
        env.set("installer_url", json!("https://example.com/setup.exe"));
        env.set("installer_path", json!(installer.to_str().unwrap()));

        let script = ChocolateyPackager::install_script(&env, "test").unwrap().unwrap();
        assert_eq!(script.get("checksum"), Some(&str_value(HELLO_SHA256)));
        assert_eq!(script.get("checksumType"), Some(&str_value("sha256")));
        assert!(script.get("checksum64").is_none());
    }

    #[test]
    fn test_checksum_follows_64bit_only_installer() {
        let temp_dir = tempfile::tempdir().unwrap();
        let installer = temp_dir.path().join("setup64.exe");
        std::fs::write(&installer, b"hello world\n").unwrap();

        let mut env = base_env();
        env.set("installer_url64", json!("https://example.com/setup64.exe"));
        env.set("installer_path", json!(installer.to_str().unwrap()));

        let script = ChocolateyPackager::install_script(&env, "test").unwrap().unwrap();
        assert_eq!(script.get("checksum64"), Some(&str_value(HELLO_SHA256)));
        assert_eq!(script.get("checksumType64"), Some(&str_value("sha256")));
        assert!(script.get("checksum").is_none());
        assert!(script.get("checksumType").is_none());
        assert!(script.get("url").is_none());
    }

    #[test]
    fn test_checksums_for_both_architectures() {
        let temp_dir = tempfile::tempdir().unwrap();
        let installer = temp_dir.path().join("setup.exe");
        let installer64 = temp_dir.path().join("setup64.exe");
        std::fs::write(&installer, b"hello world\n").unwrap();
        std::fs::write(&installer64, b"").unwrap();

        let mut env = base_env();
        env.set("installer_url", json!("https://example.com/setup.exe"));
        env.set("installer_url64", json!("https://example.com/setup64.exe"));
        env.set("installer_path", json!(installer.to_str().unwrap()));
        env.set("installer_path64", json!(installer64.to_str().unwrap()));

        let script = ChocolateyPackager::install_script(&env, "test").unwrap().unwrap();
        assert_eq!(script.get("checksum"), Some(&str_value(HELLO_SHA256)));
        assert_eq!(
            script.get("checksum64"),
            Some(&str_value("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"))
        );
    }

    #[test]
    fn test_explicit_checksum64_wins_over_hash() {
        let temp_dir = tempfile::tempdir().unwrap();
        let installer = temp_dir.path().join("setup64.exe");
        std::fs::write(&installer, b"hello world\n").unwrap();

        let mut env = base_env();
        env.set("installer_url64", json!("https://example.com/setup64.exe"));
        env.set("installer_path", json!(installer.to_str().unwrap()));
        env.set("installer_checksum64", json!("DEADBEEF"));
        env.set("installer_checksum_type64", json!("sha512"));

        let script = ChocolateyPackager::install_script(&env, "test").unwrap().unwrap();
        assert_eq!(script.get("checksum64"), Some(&str_value("DEADBEEF")));
        assert_eq!(script.get("checksumType64"), Some(&str_value("sha512")));
    }

    #[test]
    fn test_license_and_icon_from_env() {
        let mut env = base_env();
        env.set("license", json!("MIT"));
        env.set("icon", json!("icon.png"));

        let nuspec = ChocolateyPackager::descriptor(&env).unwrap().to_nuspec();
        assert!(nuspec.contains("        <icon>icon.png</icon>\n"));
        assert!(nuspec.contains("        <license type=\"expression\">MIT</license>\n"));

        env.set("license", json!("LICENSE.txt"));
        env.set("license_type", json!("file"));
        let descriptor = ChocolateyPackager::descriptor(&env).unwrap();
        assert_eq!(
            descriptor.license(),
            Some(&License::file("LICENSE.txt"))
        );

        env.set("license_type", json!("url"));
        assert!(matches!(
            ChocolateyPackager::descriptor(&env).unwrap_err(),
            Error::InvalidInput { .. }
        ));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let temp_dir = tempfile::tempdir().unwrap();
        let mut env = base_env();
        env.set("output_directory", json!(temp_dir.path().to_str().unwrap()));
        env.set("packager_backend", json!("msix"));

        let err = execute(&ChocolateyPackager, &mut env, &ProcessorContext::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }

    #[cfg(unix)]
    mod unix {
        use super::*;
        use crate::tool::test_support::fake_tool;

        const CHOCO: &str = r#"out=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outputdirectory) out="$2"; shift ;;
  esac
  shift
done
cp tools/chocolateyInstall.ps1 "$out/install.ps1" 2>/dev/null
touch "$out/test.0.0.1.nupkg"
echo "Successfully created package '$out/test.0.0.1.nupkg'""#;

        #[test]
        fn test_packages_with_chocolatey() {
            let temp_dir = tempfile::tempdir().unwrap();
            let choco = fake_tool(temp_dir.path(), "choco", CHOCO);
            let out = temp_dir.path().join("out");

            let mut ctx = ProcessorContext::default();
            ctx.config.tools.choco = Some(choco);
            ctx.config.packaging.scratch_root = Some(temp_dir.path().join("scratch"));

            let mut env = base_env();
            env.set("output_directory", json!(out.to_str().unwrap()));
            env.set("installer_url", json!("https://example.com/setup.exe"));

            execute(&ChocolateyPackager, &mut env, &ctx).unwrap();

            let path = env.get("chocolatey_package_path").unwrap().as_str().unwrap();
            assert!(path.ends_with("test.0.0.1.nupkg"));
            let summary = env.get("chocolatey_packager_summary_result").unwrap();
            assert_eq!(summary["backend"], json!("chocolatey"));
            assert_eq!(summary["install_script"], json!(true));
            assert!(env.get("chocolatey_workdir").is_none());
            assert!(std::fs::read_to_string(out.join("install.ps1"))
                .unwrap()
                .contains("url = 'https://example.com/setup.exe'"));
            assert_eq!(
                std::fs::read_dir(temp_dir.path().join("scratch")).unwrap().count(),
                0
            );
        }

        #[test]
        fn test_keep_workdir_input_wins_over_config() {
            let temp_dir = tempfile::tempdir().unwrap();
            let choco = fake_tool(temp_dir.path(), "choco", CHOCO);

            let mut ctx = ProcessorContext::default();
            ctx.config.packaging.scratch_root = Some(temp_dir.path().join("scratch"));

            let mut env = base_env();
            env.set("output_directory", json!(temp_dir.path().join("out").to_str().unwrap()));
            env.set("packager_path", json!(choco.to_str().unwrap()));
            env.set("keep_workdir", json!(true));

            execute(&ChocolateyPackager, &mut env, &ctx).unwrap();
            let workdir = env.get("chocolatey_workdir").unwrap().as_str().unwrap();
            assert!(Path::new(workdir).join("test.nuspec").is_file());
        }

        #[test]
        fn test_packaging_failure_propagates() {
            let temp_dir = tempfile::tempdir().unwrap();
            let choco = fake_tool(temp_dir.path(), "choco", "echo 'bad nuspec' >&2\nexit 1");

            let mut env = base_env();
            env.set("output_directory", json!(temp_dir.path().join("out").to_str().unwrap()));
            env.set("packager_path", json!(choco.to_str().unwrap()));

            let err = execute(&ChocolateyPackager, &mut env, &ProcessorContext::default())
                .unwrap_err();
            assert!(matches!(err, Error::Packaging { .. }));
            assert!(err.to_string().contains("bad nuspec"));
            assert!(env.get("chocolatey_package_path").is_none());
        }
    }
}
