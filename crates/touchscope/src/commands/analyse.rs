//! Analyse command implementation.
//!
//! The analyse command:
//! 1. Reads one or more touch reports
//! 2. Builds the label table
//! 3. Computes the rankings
//! 4. Writes the ranking report (and optionally the labelled groups)

use super::models::AnalyseArgs;
use crate::analysis::{commonality_ranking, invocation_ranking, key_ranking, label_groups, top_share, RankedAddress};
use crate::candidate::Group;
use crate::labels::{LabelKind, LabelTable};
use crate::output::{read_touch_report, write_json, LabeledGroupReport, RankingReport};
use anyhow::{Context, Result};
use colored::Colorize;
use log::info;
use std::time::Instant;

/// Execute the analyse command
///
/// **Public** - main entry point called from main.rs
pub fn execute_analyse(args: AnalyseArgs) -> Result<RankingReport> {
    let start_time = Instant::now();
    validate_args(&args)?;

    // Step 1: touch reports
    info!("Step 1/4: Reading {} touch report(s)...", args.touched.len());
    let mut groups: Vec<Group> = Vec::new();
    for path in &args.touched {
        let report = read_touch_report(path)
            .with_context(|| format!("Failed to read touch report {}", path.display()))?;
        groups.extend(report.groups);
    }
    info!("{} visited groups", groups.len());

    // Step 2: labels
    info!("Step 2/4: Building label table...");
    let labels = LabelTable::from_files(args.tokens.as_deref(), args.accounts.as_deref())
        .context("Failed to load label feeds")?;
    info!("{} labelled addresses", labels.len());

    // Step 3: rankings
    info!("Step 3/4: Ranking addresses...");
    let report = RankingReport::new(
        groups.len() as u64,
        commonality_ranking(&groups, &labels),
        invocation_ranking(&groups, &labels),
        key_ranking(&groups, &labels, args.top_n),
    );

    // Step 4: output
    info!("Step 4/4: Writing output files...");
    write_json(&report, &args.output).context("Failed to write ranking report")?;
    info!("✓ Ranking report written to: {}", args.output.display());

    if let Some(path) = &args.labeled_groups {
        let labeled = LabeledGroupReport::new(label_groups(&groups, &labels));
        write_json(&labeled, path).context("Failed to write labelled groups")?;
        info!("✓ Labelled groups written to: {}", path.display());
    }

    if args.print_summary {
        print_summary(&report, args.top_n);
    }

    info!("Analysis completed in {:.2}s", start_time.elapsed().as_secs_f64());
    Ok(report)
}

/// Validate analyse arguments
pub fn validate_args(args: &AnalyseArgs) -> Result<()> {
    if args.touched.is_empty() {
        anyhow::bail!("At least one touch report is required");
    }
    if args.top_n == 0 {
        anyhow::bail!("top must be greater than 0");
    }
    Ok(())
}

fn print_summary(report: &RankingReport, top_n: usize) {
    println!("\n{}", "=".repeat(80));
    println!("{}", "TOUCH ANALYSIS".bold());
    println!("{}", "=".repeat(80));
    println!("Groups:      {}", report.total_groups);
    println!("Invocations: {}", report.total_invocations);

    println!("\n{}", format!("Most common addresses (top {})", top_n).bold());
    print_rows(&report.commonality, top_n);
    println!(
        "Top {} share of groups touched (sum): {:.1}%",
        top_n,
        top_share(&report.commonality, top_n) * 100.0
    );

    println!("\n{}", format!("Most invoked addresses (top {})", top_n).bold());
    print_rows(&report.invocation, top_n);
    println!(
        "Top {} share of invocations: {:.1}%",
        top_n,
        top_share(&report.invocation, top_n) * 100.0
    );

    if !report.hot_keys.is_empty() {
        println!("\n{}", format!("Hottest storage slots (top {})", top_n).bold());
        for (i, row) in report.hot_keys.iter().enumerate() {
            println!(
                "{:>3}. {} {} {:>8} ({:.2}%)",
                i + 1,
                row.address.to_string().cyan(),
                row.key,
                row.count,
                row.proportion * 100.0
            );
        }
    }
    println!("{}", "=".repeat(80));
}

fn print_rows(rows: &[RankedAddress], top_n: usize) {
    for (i, row) in rows.iter().take(top_n).enumerate() {
        let name = if !row.label.name.is_empty() {
            row.label.name.clone()
        } else if !row.label.tag.is_empty() {
            row.label.tag.clone()
        } else {
            row.label.labels.join(",")
        };
        let name = match row.label.kind {
            LabelKind::Token => name.green(),
            LabelKind::Account => name.yellow(),
            LabelKind::Unknown => "unknown".dimmed(),
        };

        println!(
            "{:>3}. {} {:>8} ({:.2}%) {}",
            i + 1,
            row.address.to_string().cyan(),
            row.count,
            row.proportion * 100.0,
            name
        );
    }
}
