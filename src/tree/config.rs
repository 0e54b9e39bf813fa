//! Configuration types for the tree walker

/// File actions allowed to run at once when nothing else is configured.
pub const DEFAULT_MAX_PARALLEL_FILES: usize = 16;

/// Configuration for tree walking behavior.
#[derive(Debug, Clone)]
pub struct WalkerConfig {
    /// Upper bound on concurrently running file actions, shared by the whole
    /// traversal. Directory recursion is not counted against it.
    /// 0 = auto-detect (one per available core)
    pub max_parallel_files: usize,
    /// Entry names (or glob patterns) to skip, files and directories alike
    pub ignore_patterns: Vec<String>,
}

impl Default for WalkerConfig {
    fn default() -> Self {
        Self {
            max_parallel_files: DEFAULT_MAX_PARALLEL_FILES,
            ignore_patterns: Vec::new(),
        }
    }
}
