/// Pipeline configuration.
///
/// Every field here has a defined effect on the pipeline; there is no
/// catch-all map for unrecognized keys, so an unknown option simply
/// doesn't compile rather than being silently ignored at runtime.
#[derive(Clone, Debug)]
pub struct Options {
    /// If true, the public API returns the repairs list alongside the value.
    pub logging: bool,
    /// If true, the pipeline is bypassed entirely: input must already be
    /// valid JSON with no duplicate or empty keys and exactly one
    /// top-level value.
    pub strict_mode: bool,
    /// L4 may attempt a direct decode before any repair layer runs.
    pub fast_path_optimization: bool,
    /// Enables post-close key-value absorption (object-boundary merging)
    /// in the preprocessor stage.
    pub enable_object_merging: bool,
    /// Enables the fixed ten-step preprocessor block (§4.5).
    pub enable_early_hardcoded_patterns: bool,
    /// Opaque payload forwarded to the underlying strict decoder. `serde_json`
    /// takes no runtime tunables, so this is recorded but otherwise inert.
    pub jason_options: Option<serde_json::Value>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            logging: false,
            strict_mode: false,
            fast_path_optimization: true,
            enable_object_merging: true,
            enable_early_hardcoded_patterns: true,
            jason_options: None,
        }
    }
}
