use anyhow::Result;
use clap::Parser;

use competitor_intel::cli::{self, Args, Launch};
use competitor_intel::generator::context::GeneratorContext;
use competitor_intel::{launch, server};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let (quiet, log_format) = (args.quiet, args.log_format);

    // 先合并配置文件，日志级别才能读到文件中的 verbose
    let launch_mode = args.into_launch()?;
    cli::init_tracing(launch_mode.config().verbose, quiet, log_format);

    match launch_mode {
        Launch::Analyze { config, options } => {
            launch(&config, &options).await?;
        }
        Launch::Serve { config } => {
            let bind = config.server.bind.clone();
            let context = GeneratorContext::new(config)?;
            server::run(context, &bind).await?;
        }
    }

    Ok(())
}
