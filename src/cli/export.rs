//! Export command implementation

use crate::config::Config;
use crate::store::CsvLog;
use clap::Args;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Destination file (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

impl ExportArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let log = CsvLog::new(&config.log.path);
        log.initialize().await?;

        match &self.output {
            Some(dest) => {
                let bytes = log.copy_to(dest).await?;
                tracing::info!(dest = %dest.display(), bytes, "Exported flow tape");
            }
            None => {
                let bytes = log.read_all().await?;
                let mut stdout = tokio::io::stdout();
                stdout.write_all(&bytes).await?;
                stdout.flush().await?;
            }
        }
        Ok(())
    }
}
