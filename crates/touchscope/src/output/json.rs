//! JSON output writer.
//!
//! Writes reports and candidate files with pretty formatting.

use super::report::TouchReport;
use crate::utils::error::OutputError;
use log::{debug, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

/// Write any serializable value to a JSON file
///
/// **Public** - main entry point for JSON output
///
/// # Arguments
/// * `value` - Data to write
/// * `output_path` - Path to output JSON file
///
/// # Errors
/// * `OutputError::WriteFailed` - I/O error during write
/// * `OutputError::SerializationFailed` - JSON serialization error
/// * `OutputError::InvalidPath` - Path cannot be created or is invalid
pub fn write_json<T: Serialize + ?Sized>(value: &T, output_path: impl AsRef<Path>) -> Result<(), OutputError> {
    let output_path = output_path.as_ref();

    info!("Writing JSON to: {}", output_path.display());

    validate_output_path(output_path)?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            debug!("Creating parent directories: {}", parent.display());
            std::fs::create_dir_all(parent).map_err(|e| {
                OutputError::InvalidPath(format!("Cannot create directory {}: {}", parent.display(), e))
            })?;
        }
    }

    let file = File::create(output_path).map_err(OutputError::WriteFailed)?;
    let writer = BufWriter::new(file);

    serde_json::to_writer_pretty(writer, value).map_err(OutputError::SerializationFailed)?;

    info!("Written successfully ({} bytes)", calculate_file_size(output_path));

    Ok(())
}

/// Read a touch report written by the replay command
///
/// **Public** - used by analyse and validate
///
/// # Errors
/// * `OutputError::WriteFailed` - File read error (reusing WriteFailed for I/O)
/// * `OutputError::SerializationFailed` - JSON parse error
pub fn read_touch_report(input_path: impl AsRef<Path>) -> Result<TouchReport, OutputError> {
    let input_path = input_path.as_ref();

    debug!("Reading touch report from: {}", input_path.display());

    let file = File::open(input_path).map_err(OutputError::WriteFailed)?;
    let report: TouchReport =
        serde_json::from_reader(BufReader::new(file)).map_err(OutputError::SerializationFailed)?;

    debug!(
        "Touch report loaded: version {}, blocks {}..={}, {} groups",
        report.version,
        report.first_block,
        report.last_block,
        report.groups.len()
    );

    Ok(report)
}

/// Validate that output path is writable
///
/// **Private** - internal validation
fn validate_output_path(path: &Path) -> Result<(), OutputError> {
    if path.as_os_str().is_empty() {
        return Err(OutputError::InvalidPath("Path is empty".to_string()));
    }

    if path.is_dir() {
        return Err(OutputError::InvalidPath(format!(
            "Path is a directory: {}",
            path.display()
        )));
    }

    Ok(())
}

fn calculate_file_size(path: &Path) -> u64 {
    std::fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregator::TouchAddress;
    use crate::candidate::{CleanMevTx, Group, GroupId, GroupKind, GroupStatus};
    use alloy_primitives::{Address, B256};
    use std::collections::BTreeMap;
    use tempfile::NamedTempFile;

    fn create_test_report() -> TouchReport {
        let mut group = Group::new(
            GroupId(0),
            GroupKind::Liquidation {
                tx: CleanMevTx {
                    block_num: 12,
                    hash: B256::repeat_byte(3),
                    mev_type: "liquid".to_string(),
                    protocol: "aave".to_string(),
                    user_swap_cnt: 0,
                    extractor_swap_cnt: 1,
                    from: Address::repeat_byte(1),
                    to: Some(Address::repeat_byte(2)),
                },
            },
        );
        group.status = GroupStatus::Visited;
        group.touch_address_map.insert(
            Address::repeat_byte(2),
            TouchAddress {
                invoke_count: 1,
                key_histogram: BTreeMap::from([(B256::ZERO, 1)]),
            },
        );
        TouchReport::new(10, 20, vec![group])
    }

    #[test]
    fn test_write_and_read_touch_report() {
        let report = create_test_report();
        let temp_file = NamedTempFile::new().unwrap();

        write_json(&report, temp_file.path()).unwrap();
        let loaded = read_touch_report(temp_file.path()).unwrap();

        assert_eq!(loaded, report);
        assert!(loaded.problems().is_empty());
    }

    #[test]
    fn test_validate_output_path_empty() {
        assert!(validate_output_path(Path::new("")).is_err());
    }

    #[test]
    fn test_validate_output_path_directory() {
        let temp_dir = tempfile::tempdir().unwrap();
        assert!(validate_output_path(temp_dir.path()).is_err());
    }

    #[test]
    fn test_write_creates_parent_dirs() {
        let temp_dir = tempfile::tempdir().unwrap();
        let nested_path = temp_dir.path().join("nested/dirs/touched.json");

        write_json(&create_test_report(), &nested_path).unwrap();

        assert!(nested_path.exists());
    }

    #[test]
    fn test_problems_flags_out_of_range_group() {
        let mut report = create_test_report();
        report.first_block = 15;

        let problems = report.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("outside"));
    }

    #[test]
    fn test_problems_flags_group_without_touches() {
        let mut report = create_test_report();
        report.groups[0].touch_address_map.clear();

        let problems = report.problems();
        assert_eq!(problems.len(), 1);
        assert!(problems[0].contains("no touched addresses"));
    }
}
