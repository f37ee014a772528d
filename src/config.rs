/// Runtime errors tolerated per session before evaluation is abandoned.
pub const DEFAULT_MAX_RUNTIME_ERRORS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    pub max_runtime_errors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config { max_runtime_errors: DEFAULT_MAX_RUNTIME_ERRORS }
    }
}
