use anyhow::{anyhow, Result};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

static ROOT_DIR: OnceLock<PathBuf> = OnceLock::new();

/// Sets the data root. Only the first call has any effect.
pub fn init_root(root: &Path) {
    let _ = ROOT_DIR.set(root.to_path_buf());
}

/// Returns the data root, defaulting to the working directory.
pub fn get_root_dir() -> &'static PathBuf {
    ROOT_DIR.get_or_init(|| PathBuf::from("."))
}

/// Returns the logs directory: `<root>/logs/`
pub fn get_logs_dir() -> PathBuf {
    get_root_dir().join("logs")
}

/// Returns the page image directory: `<root>/images/`
pub fn get_images_dir() -> PathBuf {
    get_root_dir().join("images")
}

/// Returns the first-class marker template: `<root>/template_1.jpg`
pub fn get_first_template_path() -> PathBuf {
    get_root_dir().join("template_1.jpg")
}

/// Returns the standard marker template: `<root>/template_2.jpg`
pub fn get_standard_template_path() -> PathBuf {
    get_root_dir().join("template_2.jpg")
}

/// Returns the authoritative mapping: `<root>/page_verses.json`
pub fn get_page_verses_path() -> PathBuf {
    get_root_dir().join("page_verses.json")
}

/// Returns the marker dataset: `<root>/data.csv`
pub fn get_markers_csv_path() -> PathBuf {
    get_root_dir().join("data.csv")
}

/// Returns the highlight dataset: `<root>/data_verse.csv`
pub fn get_segments_csv_path() -> PathBuf {
    get_root_dir().join("data_verse.csv")
}

/// Returns the detection issue report: `<root>/issues.json`
pub fn get_issues_path() -> PathBuf {
    get_root_dir().join("issues.json")
}

/// Returns the default config file: `<root>/config.json`
pub fn get_config_path() -> PathBuf {
    get_root_dir().join("config.json")
}

/// Ensures all output directories exist. Call at startup.
pub fn ensure_directories() -> std::io::Result<()> {
    std::fs::create_dir_all(get_logs_dir())?;
    Ok(())
}

/// Fails with the first missing input needed by `generate`.
pub fn check_prerequisites() -> Result<()> {
    let required = [
        (get_first_template_path(), "marker template for pages 1-2"),
        (get_standard_template_path(), "marker template for pages 3-604"),
        (get_page_verses_path(), "page→verse mapping (run `fetch` first)"),
    ];
    for (path, what) in &required {
        if !path.is_file() {
            return Err(anyhow!("{} not found: {}", what, path.display()));
        }
    }
    Ok(())
}
