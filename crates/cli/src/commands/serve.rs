//! Serve command handler.

use bookchat_core::config::AppConfig;
use clap::Args;

/// Run the HTTP service
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Address to listen on (default: 0.0.0.0:8000)
    #[arg(short, long, env = "BOOKCHAT_BIND")]
    pub bind: Option<String>,
}

impl ServeCommand {
    /// Execute the serve command. Runs until the process is stopped.
    ///
    /// Missing configuration does not stop the server: it keeps answering
    /// `/health` and reports the reason on `/chat`.
    pub async fn execute(self, config: AppConfig) -> anyhow::Result<()> {
        tracing::info!("Executing serve command on {}", config.bind);

        bookchat_server::serve(config).await?;

        Ok(())
    }
}
