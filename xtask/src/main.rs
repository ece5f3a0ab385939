//! Developer tasks (schema generation, conformance checks).
//!
//! Keeping this separate avoids bloating the end-user CLI.

use anyhow::{Context, bail};
use fanout_test_util::{normalize_nondeterministic, relativize_paths};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or(manifest_dir)
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

fn contracts_fixtures_dir() -> PathBuf {
    project_root().join("contracts").join("fixtures")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    generate: fn() -> schemars::Schema,
}

fn generate_config_schema() -> schemars::Schema {
    schema_for!(fanout_settings::FanoutConfigV1)
}

fn generate_summary_schema() -> schemars::Schema {
    schema_for!(fanout_types::RunSummary)
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "fanout.config.v1.json",
            generate: generate_config_schema,
        },
        SchemaSpec {
            filename: "fanout.summary.v1.json",
            generate: generate_summary_schema,
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    fs::create_dir_all(&dir).context("create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json).with_context(|| format!("write {}", path.display()))?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Fail if schemas/ does not match what the types generate.
fn validate_schemas() -> anyhow::Result<()> {
    let dir = schemas_dir();
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual =
            fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    for name in &missing {
        eprintln!("missing schema: {name}");
    }
    for name in &mismatched {
        eprintln!("schema out of date: {name}");
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("schema validation failed")
}

fn compile_summary_validator() -> anyhow::Result<jsonschema::Validator> {
    let schema = serde_json::to_value(generate_summary_schema()).context("schema to json")?;
    jsonschema::validator_for(&schema).map_err(|e| anyhow::anyhow!("compile summary schema: {e}"))
}

/// Validate the checked-in summary samples against the summary schema.
fn conform() -> anyhow::Result<()> {
    let validator = compile_summary_validator()?;
    let dir = contracts_fixtures_dir();
    let mut errors = Vec::new();
    let mut checked = 0;

    let mut entries: Vec<PathBuf> = fs::read_dir(&dir)
        .with_context(|| format!("read {}", dir.display()))?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|x| x == "json"))
        .collect();
    entries.sort();

    for path in entries {
        let text = fs::read_to_string(&path).with_context(|| format!("read {}", path.display()))?;
        let value: serde_json::Value =
            serde_json::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        for err in validator.iter_errors(&value) {
            errors.push(format!("{}: {err}", path.display()));
        }
        if let Err(err) = serde_json::from_value::<fanout_types::RunSummary>(value) {
            errors.push(format!("{}: does not deserialize: {err}", path.display()));
        }
        checked += 1;
    }

    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("conformance failed with {} errors", errors.len());
    }
    println!("{checked} summary sample(s) conform.");
    Ok(())
}

/// Run the built `fanout` binary over every fixture in `--all` mode with a stand-in hook and
/// check the summary it writes against the schema and any `expected.summary.json` golden.
fn conform_full() -> anyhow::Result<()> {
    conform()?;

    let validator = compile_summary_validator()?;
    let mut fanout_bin = project_root().join("target").join("debug").join("fanout");
    if cfg!(windows) {
        fanout_bin.set_extension("exe");
    }
    if !fanout_bin.exists() {
        bail!(
            "fanout binary not found at {}.\nRun `cargo build -p fanout-cli` first.",
            fanout_bin.display()
        );
    }

    let temp_dir = tempfile::tempdir().context("create temp dir")?;
    let config = temp_dir.path().join("fanout.toml");
    fs::write(
        &config,
        "[hooks.check]\nprogram = \"sh\"\nargs = [\"-c\", \"exit 0\"]\n",
    )
    .context("write stand-in config")?;

    let fixtures = project_root().join("tests").join("fixtures");
    let mut fixture_dirs: Vec<PathBuf> = fs::read_dir(&fixtures)
        .context("read tests/fixtures")?
        .filter_map(|e| e.ok().map(|e| e.path()))
        .filter(|p| p.is_dir())
        .collect();
    fixture_dirs.sort();

    let mut errors = Vec::new();
    for dir in fixture_dirs {
        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let dir = dir.canonicalize().with_context(|| format!("canonicalize {name}"))?;
        let summary_out = temp_dir.path().join(format!("{name}.summary.json"));

        let output = std::process::Command::new(&fanout_bin)
            .arg("--base-dir")
            .arg(&dir)
            .arg("--boundary")
            .arg(&dir)
            .arg("--config")
            .arg(&config)
            .arg("--summary-out")
            .arg(&summary_out)
            .args(["check", "--all"])
            .output()
            .with_context(|| format!("run fanout on fixture '{name}'"))?;
        if !output.status.success() {
            errors.push(format!(
                "fixture '{name}': fanout exited with {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr)
            ));
            continue;
        }

        let text = fs::read_to_string(&summary_out)
            .with_context(|| format!("read summary for '{name}'"))?;
        let value: serde_json::Value = serde_json::from_str(&text)?;
        for err in validator.iter_errors(&value) {
            errors.push(format!("fixture '{name}': schema validation: {err}"));
        }

        let golden = dir.join("expected.summary.json");
        if golden.exists() {
            let expected: serde_json::Value = serde_json::from_str(&fs::read_to_string(&golden)?)?;
            let mut actual = normalize_nondeterministic(value);
            if let Some(base) = dir.to_str() {
                relativize_paths(&mut actual, camino::Utf8Path::new(base));
            }
            if actual != normalize_nondeterministic(expected) {
                errors.push(format!("fixture '{name}': summary differs from expected.summary.json"));
                continue;
            }
        }
        println!("  ok: {name}");
    }

    if !errors.is_empty() {
        for err in &errors {
            eprintln!("  - {err}");
        }
        bail!("full conformance failed with {} errors", errors.len());
    }
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas from Rust types to schemas/");
    eprintln!("  validate-schemas  Check if schemas/ matches generated output (for CI)");
    eprintln!("  print-schema-ids  Print known schema IDs");
    eprintln!("  conform           Validate contracts/fixtures summaries against the summary schema");
    eprintln!("  conform-full      conform + run fanout over tests/fixtures and check its summaries");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(),
        "validate-schemas" => validate_schemas(),
        "conform" => conform(),
        "conform-full" => conform_full(),
        "print-schema-ids" => {
            for spec in schema_specs() {
                println!("{}", spec.filename.trim_end_matches(".json"));
            }
            Ok(())
        }
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
