use crate::output::read_touch_report;
use crate::utils::config::SCHEMA_VERSION;
use anyhow::Result;
use colored::Colorize;
use std::path::PathBuf;

/// Validate a touch report JSON file
pub fn validate_touch_report(file_path: PathBuf) -> Result<()> {
    println!("Validating touch report: {}", file_path.display());

    let report = read_touch_report(&file_path)?;

    println!("✓ Valid touch report JSON");
    println!("  Version: {}", report.version);
    println!("  Blocks: {}..={}", report.first_block, report.last_block);
    println!("  Groups: {}", report.groups.len());
    println!(
        "  Touched addresses: {}",
        report
            .groups
            .iter()
            .map(|g| g.touch_address_map.len())
            .sum::<usize>()
    );

    let problems = report.problems();
    if problems.is_empty() {
        println!("{}", "✓ Report is consistent".green());
        return Ok(());
    }

    for problem in &problems {
        println!("  {} {}", "✗".red(), problem);
    }
    anyhow::bail!("{} consistency problem(s) found", problems.len())
}

/// Display schema information
pub fn display_schema(show_details: bool) {
    println!("Touchscope Report Schema");
    println!("Current Version: {}", SCHEMA_VERSION);
    println!();

    if show_details {
        println!("Touch report:");
        println!("  version: string            - Schema version (e.g., '1.0.0')");
        println!("  generated_at: string       - RFC 3339 timestamp");
        println!("  first_block: number        - First replayed block");
        println!("  last_block: number         - Last replayed block");
        println!("  groups: array              - Visited groups");
        println!("    id: number               - Group id");
        println!("    block_number: number     - Block containing the group");
        println!("    description: object      - arbitrage | liquidation | sandwich");
        println!("    status: string           - Always 'visited' in reports");
        println!("    touch_address_map: object - address -> touch statistics");
        println!("      invoke_count: number   - Touch events for the address");
        println!("      key_histogram: object  - storage key -> touch events");
        println!();
        println!("Ranking report:");
        println!("  total_groups: number       - Groups analysed");
        println!("  total_invocations: number  - Sum of all invocation counts");
        println!("  commonality: array         - {{address, count, proportion, label}}");
        println!("  invocation: array          - {{address, count, proportion, label}}");
        println!("  hot_keys: array            - {{address, key, count, proportion, label}}");
    } else {
        println!("Use --show for detailed schema information");
    }
}

/// Display version information
pub fn display_version() {
    println!("Touchscope v{}", env!("CARGO_PKG_VERSION"));
    println!("Report Schema: v{}", SCHEMA_VERSION);
    println!();
    println!("Replays MEV candidate blocks and measures which addresses and storage slots they touch.");
}
