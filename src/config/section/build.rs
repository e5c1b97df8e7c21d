//! `[build]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [build]
//! command = ["node", "build.mjs"]   # Build script, receives one JSON argument
//! dir = ".pagewright"               # Artifacts and loaded SSR modules
//! pages = "pages"                   # Page sources (bulk prebuild)
//! extensions = ["jsx", "svelte"]    # Page source extensions
//!
//! [build.options]                   # Passed verbatim as `config` to the script
//! minify = false
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Build step settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildConfig {
    /// Build script command (program + leading arguments).
    pub command: Vec<String>,

    /// Directory holding build artifacts and SSR modules.
    pub dir: PathBuf,

    /// Page sources root, scanned by `pagewright build`.
    pub pages: PathBuf,

    /// File extensions recognized as pages during the scan.
    pub extensions: Vec<String>,

    /// Opaque options forwarded to the build script.
    pub options: serde_json::Value,
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            command: vec!["node".into(), "build.mjs".into()],
            dir: PathBuf::from(".pagewright"),
            pages: PathBuf::from("pages"),
            extensions: ["jsx", "tsx", "svelte", "vue"]
                .into_iter()
                .map(String::from)
                .collect(),
            options: serde_json::Value::Object(serde_json::Map::new()),
        }
    }
}

impl BuildConfig {
    /// Check if a file extension marks a page source.
    pub fn is_page_extension(&self, ext: &str) -> bool {
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }

    pub(in crate::config) fn validate(&self, errors: &mut Vec<String>) {
        if self.command.is_empty() || self.command[0].trim().is_empty() {
            errors.push("[build.command] must name a program".into());
        }
        if self.extensions.is_empty() {
            errors.push("[build.extensions] must not be empty".into());
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_build_config_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.build.command, vec!["node", "build.mjs"]);
        assert!(config.build.is_page_extension("JSX"));
        assert!(!config.build.is_page_extension("md"));
        assert!(config.build.options.as_object().is_some_and(|o| o.is_empty()));
    }

    #[test]
    fn test_build_options_passthrough() {
        let config = test_parse_config(
            "[build]\ncommand = [\"deno\", \"run\", \"build.ts\"]\n[build.options]\nminify = true\ntarget = \"es2020\"",
        );
        assert_eq!(config.build.command[0], "deno");
        assert_eq!(config.build.options["minify"], serde_json::json!(true));
        assert_eq!(config.build.options["target"], serde_json::json!("es2020"));
    }

    #[test]
    fn test_build_validate_empty_command() {
        let config = test_parse_config("[build]\ncommand = []");
        let mut errors = Vec::new();
        config.build.validate(&mut errors);
        assert_eq!(errors.len(), 1);
    }
}
