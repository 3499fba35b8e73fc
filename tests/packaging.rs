// tests/packaging.rs

//! Descriptor, install script and packager behavior through the public API.

mod common;

use common::test_descriptor;
use packsmith::{DescriptorBuilder, Error, InstallScriptSpec};

const GOLDEN_NUSPEC: &str = "<package xmlns:mstns=\"http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd\" xmlns:None=\"http://schemas.microsoft.com/packaging/2013/05/nuspec.xsd\" >
    <metadata>
        <id>test</id>
        <version>0.0.1</version>
        <authors>python</authors>
    </metadata>
</package>
";

const GOLDEN_SCRIPT: &str = "$packageArgs = @{
  packageName = 'test'
  fileType = 'exe'
  url = 'https://example.com/test-setup.exe'
  url64bit = 'https://example.com/test-setup-x64.exe'
  silentArgs = '/S'
  validExitCodes = @(0)
}

Install-ChocolateyPackage @packageArgs
";

#[test]
fn test_descriptor_validation_matrix() {
    let cases = [
        (None, Some("0.0.1"), true, false, false),
        (Some("test"), None, true, false, false),
        (Some("test"), Some("0.0.1"), false, false, false),
        (Some("test"), Some("0.0.1"), true, false, true),
        (Some("test"), Some("0.0.1"), false, true, true),
        (Some("test"), Some("0.0.1"), true, true, true),
    ];

    for (id, version, authors, owners, ok) in cases {
        let mut builder = DescriptorBuilder::new();
        if let Some(id) = id {
            builder = builder.id(id);
        }
        if let Some(version) = version {
            builder = builder.version(version);
        }
        if authors {
            builder = builder.author("python");
        }
        if owners {
            builder = builder.owner("packagers");
        }

        match builder.build() {
            Ok(_) => assert!(ok, "expected failure for {:?}", (id, version, authors, owners)),
            Err(Error::Validation(_)) => {
                assert!(!ok, "expected success for {:?}", (id, version, authors, owners))
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
}

#[test]
fn test_golden_descriptor() {
    assert_eq!(test_descriptor().to_nuspec(), GOLDEN_NUSPEC);
}

#[test]
fn test_golden_install_script() {
    let script = InstallScriptSpec::new("test")
        .file_type("exe")
        .url("https://example.com/test-setup.exe")
        .url64("https://example.com/test-setup-x64.exe")
        .silent_args("/S")
        .valid_exit_codes(vec![0])
        .checksum64("", "");
    assert_eq!(script.render(), GOLDEN_SCRIPT);
}

#[cfg(unix)]
mod unix {
    use super::*;
    use common::{entry_count, fake_tool, CHOCO_SUCCESS};
    use packsmith::{ChocolateyBackend, Packager};

    #[test]
    fn test_pack_writes_golden_sources() {
        let temp_dir = tempfile::tempdir().unwrap();
        let choco = fake_tool(temp_dir.path(), "choco", CHOCO_SUCCESS);
        let scratch = temp_dir.path().join("scratch");
        let out = temp_dir.path().join("out");
        let script = InstallScriptSpec::new("test")
            .file_type("exe")
            .url("https://example.com/test-setup.exe")
            .url64("https://example.com/test-setup-x64.exe")
            .silent_args("/S")
            .valid_exit_codes(vec![0]);

        let outcome = Packager::new(Box::new(ChocolateyBackend))
            .with_program(&choco)
            .scratch_root(&scratch)
            .pack(&test_descriptor(), Some(&script), &out)
            .unwrap();

        assert!(outcome.package_path.is_file());
        assert_eq!(
            std::fs::read_to_string(out.join("test.nuspec")).unwrap(),
            GOLDEN_NUSPEC
        );
        assert_eq!(
            std::fs::read_to_string(out.join("chocolateyInstall.ps1")).unwrap(),
            GOLDEN_SCRIPT
        );
        assert_eq!(entry_count(&scratch), 0);
    }

    #[test]
    fn test_failing_tool_reports_stderr_and_cleans_up() {
        let temp_dir = tempfile::tempdir().unwrap();
        let choco = fake_tool(
            temp_dir.path(),
            "choco",
            "echo 'ERROR: id is not a valid package id' >&2\nexit 1",
        );
        let scratch = temp_dir.path().join("scratch");

        let err = Packager::new(Box::new(ChocolateyBackend))
            .with_program(&choco)
            .scratch_root(&scratch)
            .pack(&test_descriptor(), None, &temp_dir.path().join("out"))
            .unwrap_err();

        assert!(matches!(err, Error::Packaging { .. }));
        assert!(err.to_string().contains("ERROR: id is not a valid package id"));
        assert_eq!(entry_count(&scratch), 0);
    }

    #[test]
    fn test_preserved_scratch_survives_failure() {
        let temp_dir = tempfile::tempdir().unwrap();
        let choco = fake_tool(temp_dir.path(), "choco", "exit 1");
        let scratch = temp_dir.path().join("scratch");

        let result = Packager::new(Box::new(ChocolateyBackend))
            .with_program(&choco)
            .scratch_root(&scratch)
            .preserve_workdir(true)
            .pack(&test_descriptor(), None, &temp_dir.path().join("out"));

        assert!(result.is_err());
        assert_eq!(entry_count(&scratch), 1);
    }
}

#[test]
fn test_path_like_id_never_reaches_the_packager() {
    let err = DescriptorBuilder::new()
        .id("../../escaped")
        .version("0.0.1")
        .author("python")
        .build()
        .unwrap_err();
    assert!(matches!(err, Error::Validation(_)));
    assert!(err.to_string().contains("../../escaped"));
}
