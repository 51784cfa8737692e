use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_TITLE: &str = "Building Blocks: Guide To Python, One Pie At A Time";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Characters of the previous chapter carried forward between chapters.
pub const PREVIOUS_CONTEXT_CHARS: usize = 1000;
/// Characters of that carried context that make it into a chapter prompt.
pub const PROMPT_CONTEXT_CHARS: usize = 500;

/// Run configuration, passed by reference into every step.
#[derive(Debug, Clone)]
pub struct BookConfig {
    pub title: String,
    pub output_dir: PathBuf,
    /// Flat wait after every collaborator call that may be followed by another.
    pub pacing_delay: Duration,
    pub model: String,
    pub api_base: String,
    pub request_timeout: Duration,
    /// Also package the complete book as an EPUB.
    pub export_epub: bool,
    /// Shown on the confirmation screen.
    pub estimated_runtime: String,
}

impl Default for BookConfig {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            output_dir: PathBuf::from("python_pie_book"),
            pacing_delay: Duration::from_secs(5),
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            request_timeout: Duration::from_secs(300),
            export_epub: false,
            estimated_runtime: "45-60 minutes".to_string(),
        }
    }
}

impl BookConfig {
    /// No pacing, writes into `dir`.
    #[cfg(test)]
    pub fn for_tests(dir: &std::path::Path) -> Self {
        Self {
            output_dir: dir.to_path_buf(),
            pacing_delay: Duration::ZERO,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_config_presets() {
        let config = BookConfig::default();
        assert_eq!(config.pacing_delay, Duration::from_secs(5));
        assert_eq!(config.model, "gemini-2.5-flash");
        assert!(!config.export_epub);

        let test = BookConfig::for_tests(Path::new("/tmp/pie"));
        assert_eq!(test.pacing_delay, Duration::ZERO);
        assert_eq!(test.output_dir, PathBuf::from("/tmp/pie"));
        assert_eq!(test.title, DEFAULT_TITLE);
    }
}
