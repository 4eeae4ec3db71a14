//! JSON export for detection issues.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::dataset::DetectionIssue;

/// Export detection issues to a JSON file.
///
/// The output is pretty-printed for human readability. An empty list is
/// still written so stale issue files never survive a clean run.
pub fn export_issues(issues: &[DetectionIssue], output_path: &Path) -> Result<()> {
    let json =
        serde_json::to_string_pretty(issues).context("Failed to serialize issues to JSON")?;

    let mut file = File::create(output_path)
        .context(format!("Failed to create JSON file: {}", output_path.display()))?;

    file.write_all(json.as_bytes())
        .context("Failed to write JSON data")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Page;
    use tempfile::tempdir;

    #[test]
    fn test_export_issues() {
        let issues = vec![DetectionIssue {
            page: Page::new(77).unwrap(),
            expected: 12,
            detected: 11,
        }];

        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");

        export_issues(&issues, &path).unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("\"page\": 77"));
        assert!(content.contains("\"expected\": 12"));
        assert!(content.contains("\"detected\": 11"));
    }

    #[test]
    fn test_export_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("issues.json");

        export_issues(&[], &path).unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }
}
