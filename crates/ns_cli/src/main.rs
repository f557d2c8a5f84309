use clap::{Parser, Subcommand};
use ns_core::{ArticleStorage, Result};
use ns_crawler::{init_logging, CrawlArgs, Logger};
use ns_web::AppState;
use std::path::PathBuf;
use std::sync::Arc;

mod duration;

use duration::HumanDuration;

#[derive(Parser, Debug)]
#[command(author, version, about = "News sitemap crawler and query service", long_about = None)]
struct Cli {
    /// Storage backend: memory or sqlite
    #[arg(long, env = "NS_STORAGE", default_value = "sqlite")]
    storage: String,

    /// SQLite database file
    #[arg(long, env = "NS_DATABASE", default_value = "news.db")]
    database: String,

    /// Log filter, overridden by RUST_LOG
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Append logs to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Crawl the news sitemaps into storage
    Crawl {
        #[command(flatten)]
        args: CrawlArgs,

        /// Repeat the crawl forever with this pause between runs (e.g. 30m, 1h, 1d)
        #[arg(long)]
        interval: Option<HumanDuration>,
    },
    /// Serve the query API
    Serve {
        #[arg(long, env = "NS_ADDR", default_value = "0.0.0.0:5000")]
        addr: String,
    },
    /// Manage the database
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum DbAction {
    /// Create the schema and indices
    Init,
    /// Delete every record, keeping the indices
    DeleteContent,
    /// Delete all data and indices
    DeleteDb,
}

async fn crawl(
    args: CrawlArgs,
    interval: Option<HumanDuration>,
    storage: Arc<dyn ArticleStorage>,
    logger: &Logger,
) -> Result<()> {
    let Some(interval) = interval else {
        let report = ns_crawler::handle_command(&args, storage, logger).await?;
        println!("{}", report);
        return Ok(());
    };

    logger.info(&format!("Running in periodic mode every {}", interval));
    loop {
        logger.info("Starting crawl cycle");
        if let Err(e) = ns_crawler::handle_command(&args, storage.clone(), logger).await {
            logger.error(&format!("Crawl failed: {}", e));
        }
        logger.info(&format!("Waiting {} before next crawl", interval));
        tokio::time::sleep(interval.0).await;
    }
}

async fn db(action: DbAction, storage: Arc<dyn ArticleStorage>, logger: &Logger) -> Result<()> {
    match action {
        DbAction::Init => storage.init().await?,
        DbAction::DeleteContent => storage.clear_content().await?,
        DbAction::DeleteDb => storage.drop_all().await?,
    }
    logger.info(&format!("Database action {:?} done", action));
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let logger = init_logging(&cli.log_level, cli.log_file.as_deref())?.with_prefix("ns");

    let storage = ns_storage::create_storage(&cli.storage, Some(cli.database.as_str())).await?;

    match cli.command {
        Commands::Crawl { args, interval } => {
            let logger = logger.child("crawl");
            tokio::select! {
                result = crawl(args, interval, storage, &logger) => result?,
                _ = shutdown_signal() => logger.warn("Interrupted, records stored so far are kept"),
            }
        }
        Commands::Serve { addr } => {
            ns_web::serve(AppState::new(storage), &addr, shutdown_signal()).await?;
        }
        Commands::Db { action } => db(action, storage, &logger.child("db")).await?,
    }

    Ok(())
}
