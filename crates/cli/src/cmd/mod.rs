mod diff;
mod each;
mod list;
mod make;
mod publish;

pub use diff::cmd_diff;
pub use each::cmd_each;
pub use list::cmd_list;
pub use make::cmd_make;
pub use publish::cmd_publish;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use batchmake_lib::config::Config;

use crate::output::OutputFormat;

/// Settings shared by every subcommand.
pub struct Context {
  pub root: PathBuf,
  pub config: Config,
  pub format: OutputFormat,
}

impl Context {
  pub fn load(root: &Path, config: Option<&Path>, format: OutputFormat) -> Result<Self> {
    let config = Config::load(root, config).context("Failed to load configuration")?;
    Ok(Self {
      root: root.to_path_buf(),
      config,
      format,
    })
  }
}

pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
  tokio::runtime::Builder::new_current_thread()
    .enable_all()
    .build()
    .context("Failed to create async runtime")
}
