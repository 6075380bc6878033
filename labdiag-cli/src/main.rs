//! LabDiag CLI - rule-based circuit diagnosis and measurement narratives from the command line.

use clap::{Parser, Subcommand, ValueEnum};
use labdiag::library::{rule_templates_by_category, template_groups, RuleTemplate};
use labdiag::narrative::{classify, parse_actual_value, parse_expected_value, Decision};
use labdiag::{
    DiagnosisOptions, DiagnosisReport, EvaluationSettings, LabDiagCore, LabDiagError,
    LabSnapshot, RuleCategory, RuleCheck, Severity,
};
use std::path::{Path, PathBuf};
use std::process;
use tracing::level_filters::LevelFilter;

const EXIT_OK: i32 = 0;
const EXIT_FINDINGS: i32 = 1;
const EXIT_LOAD_ERROR: i32 = 2;
const EXIT_OUTPUT_ERROR: i32 = 3;

#[derive(Parser)]
#[command(name = "labdiag")]
#[command(about = "Rule-based circuit diagnosis and measurement narratives", long_about = None)]
#[command(version)]
struct Cli {
    /// Diagnostic log level written to stderr
    #[arg(long, value_enum, default_value = "warn", global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a lab snapshot and print the diagnosis
    Diagnose {
        /// Path to a snapshot JSON file (circuit, workflows, rules)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,

        /// Exit with error code if findings reach this severity or higher
        #[arg(long, value_enum)]
        fail_on: Option<FailOnSeverity>,

        /// Only evaluate rules in this category (repeatable)
        #[arg(long = "category", value_name = "CATEGORY", value_parser = parse_category)]
        categories: Vec<RuleCategory>,

        /// Absolute tolerance for `=` and `!=` comparisons
        #[arg(long, value_name = "T")]
        tolerance: Option<f64>,

        /// Skip measurement and consequence narratives
        #[arg(long)]
        no_narratives: bool,
    },

    /// Check every rule of a snapshot for structural errors
    Validate {
        /// Path to a snapshot JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormat,
    },

    /// Explain why a rule fires in the snapshot's current state
    Explain {
        /// Path to a snapshot JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Rule id to explain
        #[arg(long = "rule", value_name = "ID")]
        rule_id: String,
    },

    /// List the built-in rule template library
    Library {
        /// Only list templates in this category
        #[arg(long, value_parser = parse_category)]
        category: Option<RuleCategory>,

        /// Show consequence descriptions and explanations
        #[arg(short, long)]
        verbose: bool,
    },

    /// Classify a single reading against a tolerance string
    Classify {
        /// Expected value, e.g. "5V ± 5%", "3.3V ± 0.1V" or "1.7V - 2.0V"
        #[arg(long, value_name = "SPEC")]
        expected: String,

        /// Observed reading, e.g. "4.92V"
        #[arg(long, value_name = "VALUE")]
        actual: String,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output for scripts and CI
    Json,
}

#[derive(Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Clone, ValueEnum)]
enum FailOnSeverity {
    Critical,
    Warning,
    Info,
}

impl FailOnSeverity {
    fn threshold(&self) -> Severity {
        match self {
            FailOnSeverity::Critical => Severity::Critical,
            FailOnSeverity::Warning => Severity::Warning,
            FailOnSeverity::Info => Severity::Info,
        }
    }
}

fn parse_category(value: &str) -> Result<RuleCategory, String> {
    value.parse()
}

fn main() {
    let cli = Cli::parse();
    init_tracing(&cli.log_level);

    let exit_code = match cli.command {
        Commands::Diagnose {
            file,
            format,
            fail_on,
            categories,
            tolerance,
            no_narratives,
        } => handle_diagnose(&file, format, fail_on, categories, tolerance, no_narratives),
        Commands::Validate { file, format } => handle_validate(&file, format),
        Commands::Explain { file, rule_id } => handle_explain(&file, &rule_id),
        Commands::Library { category, verbose } => {
            handle_library(category, verbose);
            EXIT_OK
        }
        Commands::Classify { expected, actual } => handle_classify(&expected, &actual),
    };

    process::exit(exit_code);
}

fn init_tracing(level: &LogLevel) {
    let level = match level {
        LogLevel::Error => LevelFilter::ERROR,
        LogLevel::Warn => LevelFilter::WARN,
        LogLevel::Info => LevelFilter::INFO,
        LogLevel::Debug => LevelFilter::DEBUG,
        LogLevel::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_snapshot(file: &Path) -> Result<LabSnapshot, i32> {
    LabSnapshot::from_path(file).map_err(|e| {
        match e {
            LabDiagError::Io(_) => eprintln!("Error: {}: {}", file.display(), e),
            _ => eprintln!("Error: {}", e),
        }
        EXIT_LOAD_ERROR
    })
}

fn handle_diagnose(
    file: &Path,
    format: OutputFormat,
    fail_on: Option<FailOnSeverity>,
    categories: Vec<RuleCategory>,
    tolerance: Option<f64>,
    no_narratives: bool,
) -> i32 {
    let snapshot = match load_snapshot(file) {
        Ok(snapshot) => snapshot,
        Err(code) => return code,
    };

    let mut options = DiagnosisOptions {
        categories,
        ..DiagnosisOptions::default()
    };
    if let Some(tolerance) = tolerance {
        options.settings = EvaluationSettings::default().with_tolerance(tolerance);
    }
    if no_narratives {
        options.narrate_measurements = false;
        options.narrate_consequences = false;
    }

    let report = LabDiagCore::diagnose(&snapshot, &options);
    match format {
        OutputFormat::Human => output_report_human(&report),
        OutputFormat::Json => {
            if let Err(code) = print_json(serde_json::to_string_pretty(&report)) {
                return code;
            }
        }
    }

    match fail_on {
        Some(severity) if report.meets(severity.threshold()) => EXIT_FINDINGS,
        _ => EXIT_OK,
    }
}

fn print_json(rendered: serde_json::Result<String>) -> Result<(), i32> {
    match rendered {
        Ok(json) => {
            println!("{}", json);
            Ok(())
        }
        Err(e) => {
            eprintln!("Error: could not render JSON output: {}", e);
            Err(EXIT_OUTPUT_ERROR)
        }
    }
}

fn output_report_human(report: &DiagnosisReport) {
    println!("\nCircuit: {} ({})", report.circuit_name, report.circuit_id);
    println!("{}", "─".repeat(60));

    if report.evaluation.is_empty() {
        println!("  No rules triggered");
    } else {
        println!("\n  TRIGGERED RULES:");
        for rule in &report.evaluation.triggered_rules {
            println!(
                "    [{}] {} ({})",
                rule.consequence.severity.as_str().to_uppercase(),
                rule.name,
                rule.id
            );
            println!("      Consequence: {}", rule.consequence.description);
            if let Some(explanation) = report.explanations.iter().find(|e| e.rule_id == rule.id) {
                for line in explanation.text.lines() {
                    println!("      | {}", line);
                }
            }
        }
    }

    if !report.measurement_narratives.is_empty() {
        println!("\n  MEASUREMENTS:");
        for narrative in &report.measurement_narratives {
            println!(
                "    [{}] {}",
                narrative.decision.as_str().to_uppercase(),
                narrative.full_narrative
            );
            if narrative.decision != Decision::Pass {
                for action in &narrative.recommended_actions {
                    println!("      - {}", action);
                }
            }
        }
    }

    if !report.consequence_narratives.is_empty() {
        println!("\n  PREDICTED FAILURES:");
        for narrative in &report.consequence_narratives {
            println!("    - {}", narrative.full_narrative);
        }
    }

    if !report.skipped_rules.is_empty() {
        println!("\n  SKIPPED RULES:");
        for skipped in &report.skipped_rules {
            println!(
                "    - {}: {}",
                skipped.rule_id.as_deref().unwrap_or("<no id>"),
                skipped.errors.join("; ")
            );
        }
    }

    let stats = &report.stats;
    println!("\n  Summary:");
    println!("    Rules evaluated: {}", stats.rules_evaluated);
    println!("    Triggered:       {}", stats.rules_triggered);
    println!("    Skipped:         {}", stats.rules_skipped);
    println!("    Critical:        {}", stats.critical);
    println!("    Warning:         {}", stats.warning);
    println!("    Info:            {}", stats.info);
    println!(
        "    Readings:        {} pass, {} warning, {} fail",
        stats.narratives_pass, stats.narratives_warning, stats.narratives_fail
    );
}

fn handle_validate(file: &Path, format: OutputFormat) -> i32 {
    let snapshot = match load_snapshot(file) {
        Ok(snapshot) => snapshot,
        Err(code) => return code,
    };

    let checks = LabDiagCore::validate(&snapshot);
    let invalid = checks.iter().filter(|c| !c.is_valid()).count();

    match format {
        OutputFormat::Human => output_checks_human(&snapshot, &checks, invalid),
        OutputFormat::Json => {
            let output = serde_json::json!({
                "circuitId": snapshot.circuit.id,
                "rules": checks,
                "summary": {
                    "total": checks.len(),
                    "invalid": invalid,
                }
            });
            if let Err(code) = print_json(serde_json::to_string_pretty(&output)) {
                return code;
            }
        }
    }

    if invalid > 0 {
        EXIT_FINDINGS
    } else {
        EXIT_OK
    }
}

fn output_checks_human(snapshot: &LabSnapshot, checks: &[RuleCheck], invalid: usize) {
    println!("\nRules for: {} ({})", snapshot.circuit.name, snapshot.circuit.id);
    println!("{}", "─".repeat(60));

    for check in checks {
        let id = check.rule_id.as_deref().unwrap_or("<no id>");
        let label = match &check.name {
            Some(name) => format!("{} ({})", id, name),
            None => id.to_string(),
        };
        if check.is_valid() {
            println!("  ok       {}", label);
        } else {
            println!("  INVALID  {}", label);
            for error in &check.errors {
                println!("    - {}", error);
            }
        }
    }

    println!("\n  {} of {} rules invalid", invalid, checks.len());
}

fn handle_explain(file: &Path, rule_id: &str) -> i32 {
    let snapshot = match load_snapshot(file) {
        Ok(snapshot) => snapshot,
        Err(code) => return code,
    };

    match LabDiagCore::explain(&snapshot, rule_id) {
        Ok(text) => {
            println!("{}", text);
            EXIT_OK
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            EXIT_LOAD_ERROR
        }
    }
}

fn handle_library(category: Option<RuleCategory>, verbose: bool) {
    match category {
        Some(category) => {
            println!("Rule templates in category '{}':\n", category);
            for template in rule_templates_by_category(category) {
                print_template(template, verbose);
            }
        }
        None => {
            println!("Available rule templates:\n");
            for group in template_groups() {
                println!("{} ({} templates)", group.group, group.templates.len());
                for template in &group.templates {
                    print_template(template, verbose);
                }
                println!();
            }
        }
    }
}

fn print_template(template: &RuleTemplate, verbose: bool) {
    println!(
        "  {} [{}, {}]",
        template.name, template.category, template.consequence.severity
    );
    if verbose {
        println!("    Type:        {}", template.consequence.kind);
        println!("    Consequence: {}", template.consequence.description);
        println!("    Explanation: {}", template.consequence.explanation);
    }
}

fn handle_classify(expected: &str, actual: &str) -> i32 {
    let Some(expected_value) = parse_expected_value(expected) else {
        eprintln!("Error: could not parse expected value '{}'", expected);
        return EXIT_LOAD_ERROR;
    };
    let Some(actual_value) = parse_actual_value(actual) else {
        eprintln!("Error: could not parse reading '{}'", actual);
        return EXIT_LOAD_ERROR;
    };

    let decision = classify(&expected_value, actual_value.value);
    let unit = &expected_value.unit;
    println!("Expected: {}", expected_value.describe());
    println!(
        "Band:     {}{} .. {}{}",
        round_reading(expected_value.min_tolerance),
        unit,
        round_reading(expected_value.max_tolerance),
        unit
    );
    println!("Observed: {}", actual_value);
    println!("Result:   {}", decision.as_str().to_uppercase());
    EXIT_OK
}

/// Drops float noise such as `3.1999999999999997` from band edges.
fn round_reading(value: f64) -> f64 {
    (value * 1e6).round() / 1e6
}
