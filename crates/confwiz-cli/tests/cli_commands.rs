//! Commands driven by scripted answers against the sample schema file

use confwiz_cli::{Outcome, Session};
use confwiz_core::{EngineOptions, HandlerRegistry, ScriptedPrompter};
use confwiz_persist::{load_schema, ConfigDocument};
use confwiz_schema::Catalog;
use confwiz_test_utils::SAMPLE_SCHEMA_YAML;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

struct Fixture {
    dir: TempDir,
    catalog: Catalog,
    registry: HandlerRegistry,
}

impl Fixture {
    fn new() -> Self {
        colored::control::set_override(false);
        let dir = tempfile::tempdir().unwrap();
        let schema = dir.path().join("schema.yaml");
        fs::write(&schema, SAMPLE_SCHEMA_YAML).unwrap();
        Self {
            catalog: load_schema(&schema).unwrap(),
            registry: HandlerRegistry::with_defaults(),
            dir,
        }
    }

    fn session(&self) -> Session<'_> {
        Session::new(&self.catalog, &self.registry)
    }

    fn path(&self, name: &str) -> std::path::PathBuf {
        self.dir.path().join(name)
    }
}

fn text(out: Vec<u8>) -> String {
    String::from_utf8(out).unwrap()
}

fn create_simple(fx: &Fixture, path: &Path, answers: &[&str]) -> (Outcome, String) {
    let mut prompter = ScriptedPrompter::new(answers.iter().copied());
    let mut out: Vec<u8> = Vec::new();
    let outcome = fx
        .session()
        .new_config("SimpleConfig", path, &mut prompter, &mut out)
        .unwrap();
    assert_eq!(prompter.remaining(), 0);
    (outcome, text(out))
}

#[test]
fn new_saves_metadata_and_values() {
    let fx = Fixture::new();
    let path = fx.path("configs/simple.yaml");
    let (outcome, out) = create_simple(&fx, &path, &["svc", "7", "", "", "", ""]);

    assert_eq!(outcome, Outcome::Saved(path.clone()));
    assert!(out.contains("Configuring: SimpleConfig"));
    assert!(out.contains("Class: demo.SimpleConfig"));
    assert!(out.contains("SimpleConfig Summary"));
    assert!(out.contains("Configuration saved to"));

    let doc = ConfigDocument::load(&path).unwrap();
    assert_eq!(doc.metadata.model_type, "SimpleConfig");
    assert_eq!(doc.metadata.configuration_class, "demo.SimpleConfig");
    assert_eq!(doc.configuration["label"], json!("svc"));
    assert_eq!(doc.configuration["count"], json!(7));
    assert_eq!(doc.configuration["amount"], json!("0.01"));
}

#[test]
fn declining_save_writes_nothing() {
    let fx = Fixture::new();
    let path = fx.path("simple.yaml");
    let (outcome, out) = create_simple(&fx, &path, &["svc", "", "", "", "", "n"]);

    assert_eq!(outcome, Outcome::Discarded);
    assert!(out.contains("Configuration not saved."));
    assert!(!path.exists());
}

#[test]
fn abort_reports_and_writes_nothing() {
    let fx = Fixture::new();
    let path = fx.path("simple.yaml");
    let mut prompter = ScriptedPrompter::new(["svc", "!abort"]);
    let mut out: Vec<u8> = Vec::new();

    let outcome = fx
        .session()
        .new_config("SimpleConfig", &path, &mut prompter, &mut out)
        .unwrap();
    assert_eq!(outcome, Outcome::Aborted);
    assert_eq!(outcome.exit_code(), 1);
    assert!(text(out).contains("Aborted."));
    assert!(!path.exists());
}

#[test]
fn complex_defaults_skip_frozen_fields() {
    let fx = Fixture::new();
    let path = fx.path("complex.yaml");
    let mut answers = vec!["model"];
    answers.extend([""; 11]);
    let mut prompter = ScriptedPrompter::new(answers);
    let mut out: Vec<u8> = Vec::new();

    let outcome = fx
        .session()
        .new_config("demo.ComplexConfig", &path, &mut prompter, &mut out)
        .unwrap();
    assert_eq!(outcome, Outcome::Saved(path.clone()));

    let doc = ConfigDocument::load(&path).unwrap();
    assert!(doc.configuration.get("created").is_none());
    assert_eq!(doc.configuration["inner"], json!({"name": "default", "value": 10}));
    assert_eq!(doc.configuration["strategy"], json!("balanced"));
}

#[test]
fn edit_keeps_unchanged_values() {
    let fx = Fixture::new();
    let path = fx.path("simple.yaml");
    create_simple(&fx, &path, &["svc", "7", "n", "", "1.25", ""]);

    let edited = fx.path("edited.yaml");
    let mut prompter = ScriptedPrompter::new(["renamed", "", "", "", "", ""]);
    let mut out: Vec<u8> = Vec::new();
    let outcome = fx
        .session()
        .edit_config(&path, Some(&edited), &mut prompter, &mut out)
        .unwrap();

    assert_eq!(outcome, Outcome::Saved(edited.clone()));
    assert!(text(out).contains("Editing: SimpleConfig"));
    let doc = ConfigDocument::load(&edited).unwrap();
    assert_eq!(doc.configuration["label"], json!("renamed"));
    assert_eq!(doc.configuration["count"], json!(7));
    assert_eq!(doc.configuration["enabled"], json!(false));
    assert_eq!(doc.configuration["amount"], json!("1.25"));
}

#[test]
fn edit_requires_metadata() {
    let fx = Fixture::new();
    let path = fx.path("bare.yaml");
    fs::write(&path, "configuration:\n  label: x\n").unwrap();

    let mut prompter = ScriptedPrompter::new(Vec::<String>::new());
    let err = fx
        .session()
        .edit_config(&path, None, &mut prompter, &mut Vec::<u8>::new())
        .unwrap_err();
    assert!(err.to_string().contains("No configuration class found"));
}

#[test]
fn validate_reports_each_failure() {
    let fx = Fixture::new();
    let path = fx.path("bad.yaml");
    fs::write(
        &path,
        "_metadata:\n  model_type: svc\n  configuration_class: demo.SimpleConfig\n\
         configuration:\n  label: x\n  count: -1\n  ratio: fast\n",
    )
    .unwrap();

    let mut out: Vec<u8> = Vec::new();
    let outcome = fx.session().validate(&path, None, &mut out).unwrap();
    assert_eq!(outcome, Outcome::Invalid);
    let out = text(out);
    assert!(out.contains("Validation Errors:"));
    assert!(out.contains("  count:"), "{out}");
    assert!(out.contains("  ratio:"), "{out}");
}

#[test]
fn validate_uses_model_when_metadata_is_missing() {
    let fx = Fixture::new();
    let path = fx.path("plain.yaml");
    fs::write(&path, "configuration:\n  label: x\n  amount: '2.5'\n").unwrap();

    let err = fx.session().validate(&path, None, &mut Vec::<u8>::new()).unwrap_err();
    assert!(err.to_string().contains("--model"));

    let mut out: Vec<u8> = Vec::new();
    let outcome = fx.session().validate(&path, Some("SimpleConfig"), &mut out).unwrap();
    assert_eq!(outcome, Outcome::Valid);
    assert!(text(out).contains("Valid SimpleConfig configuration"));
}

#[test]
fn saved_file_validates_with_model_type() {
    let fx = Fixture::new();
    let path = fx.path("simple.yaml");
    create_simple(&fx, &path, &["svc", "", "", "", "", ""]);

    let mut out: Vec<u8> = Vec::new();
    assert_eq!(fx.session().validate(&path, None, &mut out).unwrap(), Outcome::Valid);
    assert!(text(out).contains("Valid SimpleConfig configuration for SimpleConfig"));
}

#[test]
fn show_schema_and_list_print_tables() {
    let fx = Fixture::new();
    let session = fx.session().with_options(EngineOptions::new());

    let mut out: Vec<u8> = Vec::new();
    assert_eq!(session.show_schema("ComplexConfig", &mut out).unwrap(), Outcome::Shown);
    let out = text(out);
    assert!(out.contains("Schema: ComplexConfig"));
    assert!(out.contains("created") && out.contains("auto"));

    let mut out: Vec<u8> = Vec::new();
    session.list(&mut out).unwrap();
    let out = text(out);
    for name in ["demo.InnerModel", "demo.SimpleConfig", "demo.ComplexConfig"] {
        assert!(out.contains(name), "missing {name}");
    }
}

#[test]
fn unknown_structure_is_an_error() {
    let fx = Fixture::new();
    let err = fx.session().show_schema("Missing", &mut Vec::<u8>::new()).unwrap_err();
    assert!(err.to_string().contains("Failed to resolve structure 'Missing'"));
}
