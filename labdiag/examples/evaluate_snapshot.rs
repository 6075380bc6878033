//! Diagnose a lab snapshot and print what fired and why.

use labdiag::prelude::*;
use std::path::Path;

fn main() -> Result<(), LabDiagError> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "tests/fixtures/audio_amplifier.json".to_string());
    let path = Path::new(&path);

    if !path.exists() {
        eprintln!("File not found: {}", path.display());
        eprintln!("Usage: cargo run --example evaluate_snapshot [path/to/snapshot.json]");
        std::process::exit(1);
    }

    let snapshot = LabSnapshot::from_path(path)?;
    let report = LabDiagCore::diagnose(&snapshot, &DiagnosisOptions::default());

    println!("Diagnosis for: {} ({})", report.circuit_name, report.circuit_id);
    println!(
        "Rules triggered: {} of {}",
        report.stats.rules_triggered, report.stats.rules_evaluated
    );
    println!();

    for explanation in &report.explanations {
        println!("{}", explanation.text);
        println!();
    }

    for narrative in &report.measurement_narratives {
        println!("[{}] {}", narrative.decision, narrative.full_narrative);
    }

    if report.has_critical() {
        println!("\nCritical faults predicted.");
        std::process::exit(1);
    }

    println!("\nNo critical faults predicted.");
    Ok(())
}
