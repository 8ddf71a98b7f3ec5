//! Watchtower Verify CLI
//!
//! Command-line interface for transparency log operations:
//! - Verify: Check every leaf in a log file against a public key
//! - Inspect: Display a single leaf's contents and recomputed id

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use watchtower_verify::{diff_leaves, inspect_leaf_file, verify_log_path};

#[derive(Parser)]
#[command(name = "watchtower-verify")]
#[command(about = "Watchtower transparency log verification and inspection tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify every leaf in an NDJSON log file against a public key
    Verify {
        /// Path to a leaves-YYYY-MM-DD.ndjson file
        file: PathBuf,
        /// Base64 SPKI-DER Ed25519 public key
        #[arg(long)]
        public_key: String,
    },
    /// Inspect a single leaf (one JSON object, e.g. one NDJSON line)
    Inspect {
        /// Path to a file containing one leaf JSON object
        file: String,
        /// Base64 SPKI-DER Ed25519 public key to check the signature against
        #[arg(long)]
        public_key: Option<String>,
    },
    /// Diff two leaf JSON files field-by-field
    Diff { file_a: String, file_b: String },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Verify { file, public_key } => match verify_log_path(&file, &public_key) {
            Ok(report) => {
                println!("╔══════════════════════════════════════════════════════════╗");
                println!("║              Transparency Log Verification               ║");
                println!("╚══════════════════════════════════════════════════════════╝");
                println!();
                println!("Total leaves:   {}", report.total_leaves);
                println!("Valid leaves:   {}", report.valid_leaves);
                println!("Invalid leaves: {}", report.invalid_leaves);

                if !report.errors.is_empty() {
                    println!();
                    println!("Errors:");
                    for err in &report.errors {
                        println!("  - line {}: {}", err.line, err.error);
                    }
                }

                std::process::exit(if report.invalid_leaves == 0 { 0 } else { 1 });
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Inspect { file, public_key } => match inspect_leaf_file(&file, public_key.as_deref()) {
            Ok(inspection) => {
                println!("╔══════════════════════════════════════════════════════════╗");
                println!("║                   Leaf Inspection                        ║");
                println!("╚══════════════════════════════════════════════════════════╝");
                println!();
                println!("Leaf ID:         {}", inspection.leaf_id);
                println!("Leaf ID matches: {}", if inspection.leaf_id_matches { "✓ Yes" } else { "✗ No" });
                match inspection.signature_valid {
                    Some(valid) => println!("Signature valid: {}", if valid { "✓ Yes" } else { "✗ No" }),
                    None => println!("Signature valid: (no public key supplied)"),
                }
                println!("Agent ID:        {}", inspection.agent_id);
                println!("Overall risk:    {}", inspection.overall_risk);
                println!("Written at:      {}", inspection.written_at);
                println!();
                println!("Details:");
                println!("{}", serde_json::to_string_pretty(&inspection.details).unwrap());
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Commands::Diff { file_a, file_b } => {
            let json_a = std::fs::read_to_string(&file_a).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {}", file_a, e);
                std::process::exit(1);
            });
            let json_b = std::fs::read_to_string(&file_b).unwrap_or_else(|e| {
                eprintln!("Error reading {}: {}", file_b, e);
                std::process::exit(1);
            });
            match diff_leaves(&json_a, &json_b) {
                Ok(diff) => {
                    println!("Leaf A: {}", diff.leaf_a_id);
                    println!("Leaf B: {}", diff.leaf_b_id);
                    if diff.differences.is_empty() {
                        println!("No differences.");
                    } else {
                        println!("Differences:");
                        for d in &diff.differences {
                            println!("  {}: {} -> {}", d.field, d.value_a, d.value_b);
                        }
                    }
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}
