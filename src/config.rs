use anyhow::ensure;

/// How the whole range gets rendered to the output file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Strategy {
    /// A single task renders and writes every line in ascending order.
    Sequential,
    /// Workers render contiguous ranges in parallel and a single writer task appends them.
    Pipeline,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(default)]
pub struct Config {
    pub log_level: String,
    pub output_file: String,
    // Inclusive upper bound of the rendered range.
    pub end: u32,
    pub worker_count: usize,
    pub strategy: Strategy,
    // Makes the writer hold early chunks back so the file is ascending end-to-end.
    pub ordered: bool,
}

impl Config {
    /// Loads the config file at `path` on top of the defaults. A missing file is not an error.
    pub fn new(path: &str) -> anyhow::Result<Self> {
        let config: Self = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.worker_count > 0, "worker_count must be at least 1");
        ensure!(!self.output_file.is_empty(), "output_file must not be empty");
        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            output_file: "numbers.txt".to_string(),
            end: 0xFF_FFFF,
            worker_count: 10,
            strategy: Strategy::Pipeline,
            ordered: false,
        }
    }
}
