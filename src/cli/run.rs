//! Run command implementation

use super::view::render_rows;
use crate::config::Config;
use crate::service::FlowService;
use crate::source::WsFlowSource;
use clap::Args;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Args, Debug)]
pub struct RunArgs {
    /// Override the stream URL
    #[arg(long)]
    pub url: Option<String>,

    /// Override the CSV tape path
    #[arg(long)]
    pub log_path: Option<PathBuf>,

    /// Rows shown on each refresh
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Don't print the table, only log
    #[arg(short, long)]
    pub quiet: bool,
}

impl RunArgs {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &Config) -> Config {
        let mut config = config.clone();
        if let Some(url) = &self.url {
            config.stream.url = url.clone();
        }
        if let Some(path) = &self.log_path {
            config.log.path = path.clone();
        }
        if let Some(limit) = self.limit {
            config.table.snapshot_limit = limit;
        }
        config
    }

    pub async fn execute(&self, config: &Config) -> anyhow::Result<()> {
        let config = self.apply(config);
        let source = WsFlowSource::new(config.stream.ws_config());
        let service = FlowService::start(&config, &source).await?;
        let reader = service.reader();

        let mut refresh = tokio::time::interval(Duration::from_secs(
            config.ui.refresh_interval_secs.max(1),
        ));
        refresh.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = refresh.tick() => {
                    let state = *source.state().borrow();
                    let stats = service.stats().await;
                    tracing::info!(
                        state = ?state,
                        received = stats.messages_received,
                        appended = stats.rows_appended,
                        rejected = stats.rejected,
                        log_failures = stats.log_failures,
                        "Flow status"
                    );
                    if !self.quiet {
                        let rows = reader.latest().await;
                        println!("{}", render_rows(&rows));
                    }
                    if service.is_finished() {
                        tracing::warn!("Flow stream gave up");
                        break;
                    }
                }
                result = tokio::signal::ctrl_c() => {
                    result?;
                    tracing::info!("Interrupted, shutting down");
                    break;
                }
            }
        }

        service.shutdown();
        Ok(())
    }
}
