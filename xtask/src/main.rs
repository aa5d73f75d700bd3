//! Developer tasks (schema generation and conformance).
//!
//! Keeping this separate keeps the library crates free of file IO.

use anyhow::{Context, bail};
use schemars::schema_for;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the project root (parent of xtask directory).
fn project_root() -> PathBuf {
    let manifest_dir = std::env::var("CARGO_MANIFEST_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."));

    match manifest_dir.parent() {
        Some(parent) if manifest_dir.ends_with("xtask") => parent.to_path_buf(),
        _ => manifest_dir,
    }
}

fn schemas_dir() -> PathBuf {
    project_root().join("schemas")
}

/// Schema definition with its target filename.
struct SchemaSpec {
    filename: &'static str,
    /// Name of the matching sample in `resguard_test_util::sample_responses`, if any.
    sample: Option<&'static str>,
    generate: fn() -> schemars::Schema,
}

fn schema_specs() -> Vec<SchemaSpec> {
    vec![
        SchemaSpec {
            filename: "resguard.analyze-request.json",
            sample: None,
            generate: || schema_for!(resguard_types::AnalyzeRequest),
        },
        SchemaSpec {
            filename: "resguard.analyze-stack-request.json",
            sample: None,
            generate: || schema_for!(resguard_types::AnalyzeStackRequest),
        },
        SchemaSpec {
            filename: "resguard.analyze-response.json",
            sample: Some("analyze_response"),
            generate: || schema_for!(resguard_types::AnalyzeResponse),
        },
        SchemaSpec {
            filename: "resguard.remediate-response.json",
            sample: Some("remediate_response"),
            generate: || schema_for!(resguard_types::RemediateResponse),
        },
        SchemaSpec {
            filename: "resguard.analyzer-info.json",
            sample: Some("analyzer_info"),
            generate: || schema_for!(resguard_types::AnalyzerInfo),
        },
        SchemaSpec {
            filename: "resguard.configure-request.json",
            sample: None,
            generate: || schema_for!(resguard_types::ConfigureRequest),
        },
        SchemaSpec {
            filename: "resguard.initial-config.json",
            sample: None,
            generate: || schema_for!(resguard_settings::InitialConfig),
        },
    ]
}

/// Serialize a schema to pretty-printed JSON with trailing newline.
fn serialize_schema(schema: &schemars::Schema) -> anyhow::Result<String> {
    let mut json = serde_json::to_string_pretty(schema).context("Failed to serialize schema")?;
    json.push('\n');
    Ok(json)
}

fn emit_schemas(dir: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(dir).context("Failed to create schemas directory")?;

    for spec in schema_specs() {
        let json = serialize_schema(&(spec.generate)())?;
        let path = dir.join(spec.filename);
        fs::write(&path, &json)
            .with_context(|| format!("Failed to write schema to {}", path.display()))?;
        println!("Wrote {}", path.display());
    }

    println!("\nSchemas emitted successfully.");
    Ok(())
}

/// Fail when the schemas in `dir` differ from what would be generated.
fn check_schemas(dir: &Path) -> anyhow::Result<()> {
    let mut missing = Vec::new();
    let mut mismatched = Vec::new();

    for spec in schema_specs() {
        let path = dir.join(spec.filename);
        if !path.exists() {
            missing.push(spec.filename);
            continue;
        }
        let expected = serialize_schema(&(spec.generate)())?;
        let actual = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if expected != actual {
            mismatched.push(spec.filename);
        }
    }

    if missing.is_empty() && mismatched.is_empty() {
        println!("All schemas are up to date.");
        return Ok(());
    }
    for name in &missing {
        eprintln!("  missing: {name}");
    }
    for name in &mismatched {
        eprintln!("  out of date: {name}");
    }
    eprintln!("\nRun `cargo xtask emit-schemas` to regenerate.");
    bail!("Schema validation failed")
}

/// Validate the sample responses against freshly generated schemas.
fn conform() -> anyhow::Result<()> {
    let samples = resguard_test_util::sample_responses();
    let mut failures = 0usize;

    for spec in schema_specs() {
        let Some(sample_name) = spec.sample else {
            continue;
        };
        let Some((_, sample)) = samples.iter().find(|(name, _)| *name == sample_name) else {
            bail!("no sample named {sample_name} for {}", spec.filename);
        };

        let schema = serde_json::to_value((spec.generate)())
            .with_context(|| format!("Failed to serialize {}", spec.filename))?;
        let validator = jsonschema::validator_for(&schema)
            .map_err(|e| anyhow::anyhow!("Failed to compile {}: {e}", spec.filename))?;

        let errors: Vec<String> = validator
            .iter_errors(sample)
            .map(|e| e.to_string())
            .collect();
        if errors.is_empty() {
            println!("✓ {sample_name} conforms to {}", spec.filename);
        } else {
            failures += errors.len();
            eprintln!("✗ {sample_name} violates {}:", spec.filename);
            for e in errors {
                eprintln!("    {e}");
            }
        }
    }

    if failures > 0 {
        bail!("Conformance failed with {failures} errors");
    }
    Ok(())
}

fn print_help() {
    eprintln!("xtask commands:");
    eprintln!("  help              Show this message");
    eprintln!("  emit-schemas      Generate JSON schemas of the wire types to schemas/");
    eprintln!("  check-schemas     Check that schemas/ matches generated output (for CI)");
    eprintln!("  conform           Validate sample responses against the generated schemas");
}

fn main() -> anyhow::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cmd = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match cmd {
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        "emit-schemas" => emit_schemas(&schemas_dir()),
        "check-schemas" => check_schemas(&schemas_dir()),
        "conform" => conform(),
        other => bail!("unknown xtask command: {other}\n\nRun `cargo xtask help` for usage."),
    }
    .context("xtask failed")
}
