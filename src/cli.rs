//! Command-line interface definition.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "extraction-evaluator",
    version,
    about = "Evaluate extracted document data against ground truth, or assess its confidence"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Compare extracted values with expected values and write a report
    Evaluate(EvaluateArgs),
    /// Rate each extracted value's confidence and list alerts
    Assess(AssessArgs),
}

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Directory holding `<class>.json|yaml` schemas
    #[arg(long)]
    pub schema_dir: PathBuf,

    /// Ground-truth values (JSON or YAML)
    #[arg(long)]
    pub expected: PathBuf,

    /// Extracted values (JSON or YAML)
    #[arg(long)]
    pub actual: PathBuf,

    /// Document class naming the schema
    #[arg(long = "class")]
    pub document_class: String,

    /// Defaults to the file stem of `--actual`
    #[arg(long)]
    pub document_id: Option<String>,

    /// Root directory for report artifacts
    #[arg(long, default_value = ".")]
    pub out: PathBuf,
}

#[derive(Debug, Args)]
pub struct AssessArgs {
    #[arg(long)]
    pub schema_dir: PathBuf,

    #[arg(long)]
    pub actual: PathBuf,

    #[arg(long = "class")]
    pub document_class: String,

    #[arg(long, default_value = "section-1")]
    pub section_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_evaluate() {
        let cli = Cli::parse_from([
            "extraction-evaluator",
            "evaluate",
            "--schema-dir",
            "schemas",
            "--expected",
            "expected.json",
            "--actual",
            "actual.json",
            "--class",
            "invoice",
        ]);
        let Commands::Evaluate(args) = cli.command else {
            panic!("expected evaluate");
        };
        assert_eq!(args.document_class, "invoice");
        assert_eq!(args.out, PathBuf::from("."));
        assert!(args.document_id.is_none());
    }

    #[test]
    fn parses_assess() {
        let cli = Cli::parse_from([
            "extraction-evaluator",
            "assess",
            "--schema-dir",
            "schemas",
            "--actual",
            "actual.yaml",
            "--class",
            "receipt",
        ]);
        let Commands::Assess(args) = cli.command else {
            panic!("expected assess");
        };
        assert_eq!(args.section_id, "section-1");
    }
}
