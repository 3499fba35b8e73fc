// tests/pipeline.rs

//! Processors chained through a shared environment, the way a host runs them.

mod common;

use packsmith::processor::{self, ProcessorEnv};
use packsmith::{Error, ProcessorContext};
use serde_json::json;

#[test]
fn test_every_processor_validates_required_inputs() {
    let ctx = ProcessorContext::default();
    for processor in processor::registry() {
        let mut env = ProcessorEnv::new();
        let required: Vec<&str> = processor
            .input_variables()
            .iter()
            .filter(|v| v.required && v.default.is_none())
            .map(|v| v.name)
            .collect();
        assert!(!required.is_empty(), "{} declares no required input", processor.name());

        let err = processor::execute(processor.as_ref(), &mut env, &ctx).unwrap_err();
        match err {
            Error::Validation(msg) => {
                for name in required {
                    assert!(msg.contains(name), "{}: {} not reported", processor.name(), name);
                }
            }
            other => panic!("{}: unexpected error {other}", processor.name()),
        }
    }
}

#[test]
fn test_makecatalogs_idle_without_import() {
    let ctx = ProcessorContext::default();
    let mut env = ProcessorEnv::new();
    env.set("munki_repo", json!("/srv/munki_repo"));

    let makecatalogs = processor::find("MakeCatalogs").unwrap();
    processor::execute(makecatalogs.as_ref(), &mut env, &ctx).unwrap();
    assert!(!env.is_present("makecatalogs_resultcode"));
}

#[cfg(unix)]
#[test]
fn test_import_then_rebuild_catalogs() {
    use common::fake_tool;

    let temp_dir = tempfile::tempdir().unwrap();
    let repo = temp_dir.path().join("repo");
    std::fs::create_dir(&repo).unwrap();
    let pkg = temp_dir.path().join("Firefox-118.0.1.dmg");
    std::fs::write(&pkg, b"dmg").unwrap();

    let log = temp_dir.path().join("calls.log");
    let munkiimport = fake_tool(
        temp_dir.path(),
        "munkiimport",
        &format!("echo munkiimport >> '{}'", log.display()),
    );
    let makecatalogs = fake_tool(
        temp_dir.path(),
        "makecatalogs",
        &format!("echo \"makecatalogs $1 $2\" >> '{}'", log.display()),
    );

    let mut ctx = ProcessorContext::default();
    ctx.config.tools.munkiimport = Some(munkiimport);
    ctx.config.tools.makecatalogs = Some(makecatalogs);

    let mut env = ProcessorEnv::new();
    env.set("pkg_path", json!(pkg.to_str().unwrap()));
    env.set("munki_repo", json!(repo.to_str().unwrap()));
    env.set("repo_subdirectory", json!("apps/firefox"));

    for name in ["MunkiImporter", "MakeCatalogs"] {
        let processor = processor::find(name).unwrap();
        processor::execute(processor.as_ref(), &mut env, &ctx).unwrap();
    }

    let calls = std::fs::read_to_string(&log).unwrap();
    let calls: Vec<&str> = calls.lines().collect();
    assert_eq!(calls[0], "munkiimport");
    assert!(calls[1].starts_with("makecatalogs --repo_url file:///"));
    assert!(calls[1].ends_with("/repo"));
    assert_eq!(env.get("munki_repo_changed"), Some(&json!(true)));
    assert_eq!(
        env.get("munki_importer_summary_result").unwrap()["repo_subdirectory"],
        json!("apps/firefox")
    );
    assert_eq!(env.get("makecatalogs_resultcode"), Some(&json!(0)));
}
