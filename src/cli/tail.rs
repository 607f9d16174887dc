//! Tail command implementation

use super::view::render_rows;
use crate::config::Config;
use crate::store::CsvLog;
use clap::Args;

#[derive(Args, Debug)]
pub struct TailArgs {
    /// Number of rows to show (defaults to the configured snapshot limit)
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}

impl TailArgs {
    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let log = CsvLog::new(&config.log.path);
        let rows = log.read_rows().await?;
        let limit = self.limit.unwrap_or(config.table.snapshot_limit);
        let skip = rows.len().saturating_sub(limit);
        print!("{}", render_rows(&rows[skip..]));
        Ok(())
    }
}
