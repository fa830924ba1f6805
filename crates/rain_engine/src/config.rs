//! Configuration for compilation sessions.

use std::collections::HashMap;
use std::path::PathBuf;

/// Environment variable naming the standard library directory.
pub const RAINLIB: &str = "RAINLIB";

/// Configuration for a [`crate::Session`].
///
/// Controls where imports are found and what a JIT-run program sees.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Directories searched for imports after the importing file's own
    /// directory.
    pub search_paths: Vec<PathBuf>,

    /// Standard library directory, searched last.
    pub stdlib: Option<PathBuf>,

    /// In-memory modules by name. These shadow files.
    pub sources: HashMap<String, String>,

    /// Arguments returned by `args()` in JIT runs.
    pub args: Vec<String>,

    /// Name recorded in emitted object files.
    pub object_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            search_paths: Vec::new(),
            stdlib: None,
            sources: HashMap::new(),
            args: Vec::new(),
            object_name: "rain".to_string(),
        }
    }
}

impl SessionConfig {
    /// Creates a configuration whose standard library comes from `RAINLIB`.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            stdlib: std::env::var_os(RAINLIB).map(PathBuf::from),
            ..Self::default()
        }
    }

    /// Builder method to add an import search directory.
    #[must_use]
    pub fn with_search_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.search_paths.push(path.into());
        self
    }

    /// Builder method to set the standard library directory.
    #[must_use]
    pub fn with_stdlib(mut self, path: impl Into<PathBuf>) -> Self {
        self.stdlib = Some(path.into());
        self
    }

    /// Builder method to add an in-memory module.
    #[must_use]
    pub fn with_source(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.sources.insert(name.into(), text.into());
        self
    }

    /// Builder method to set program arguments.
    #[must_use]
    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Builder method to set the object file name.
    #[must_use]
    pub fn with_object_name(mut self, name: impl Into<String>) -> Self {
        self.object_name = name.into();
        self
    }
}
