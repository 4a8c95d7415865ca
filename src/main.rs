use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use lectern::config::Config;
use lectern::feed::{self, FetchOptions};
use lectern::opml;
use lectern::storage::{Database, DatabaseError, NewSubscription};
use lectern::util::validate_url;

/// Get the config directory path (~/.config/lectern/)
fn default_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home).join(".config").join("lectern"))
}

#[derive(Parser, Debug)]
#[command(name = "lectern", about = "Feed subscription manager with OPML import")]
struct Cli {
    /// Directory holding config.toml and the subscription database
    #[arg(long, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Import subscriptions from an OPML file
    Import {
        /// Path to the OPML file
        file: PathBuf,
    },
    /// Subscribe to a single feed by URL
    Add {
        /// Feed (XML) URL
        xml_url: String,
    },
    /// List all subscriptions as JSON
    List,
    /// Print a subscription's channel as JSON, fetching if not cached
    Get {
        /// Subscription title
        title: String,
        /// Bypass the cache and fetch the feed now
        #[arg(long)]
        fresh: bool,
    },
    /// Remove a subscription by title
    Delete {
        /// Subscription title
        title: String,
    },
    /// Re-fetch every subscription's channel into the cache
    Refresh,
}

/// Everything a command handler needs, built once at startup.
struct AppContext {
    config: Config,
    db: Database,
    client: reqwest::Client,
}

impl AppContext {
    fn fetch_options(&self) -> FetchOptions {
        FetchOptions {
            timeout: Duration::from_secs(self.config.fetch_timeout_secs),
            cache_ttl_minutes: self.config.cache_ttl_minutes,
            concurrency: self.config.refresh_concurrency,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config_dir = match cli.config_dir {
        Some(dir) => dir,
        None => default_config_dir()?,
    };
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
    }

    let config = Config::load(&config_dir.join("config.toml"))?;

    let db_path = config_dir.join("subscriptions.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = Database::open(db_path_str)
        .await
        .context("Failed to open database")?;

    let client = reqwest::Client::builder()
        .user_agent(concat!("lectern/", env!("CARGO_PKG_VERSION")))
        .build()
        .context("Failed to build HTTP client")?;

    let ctx = AppContext { config, db, client };

    match cli.command {
        Command::Import { file } => cmd_import(&ctx, &file).await,
        Command::Add { xml_url } => cmd_add(&ctx, &xml_url).await,
        Command::List => cmd_list(&ctx).await,
        Command::Get { title, fresh } => cmd_get(&ctx, &title, fresh).await,
        Command::Delete { title } => cmd_delete(&ctx, &title).await,
        Command::Refresh => cmd_refresh(&ctx).await,
    }
}

async fn cmd_import(ctx: &AppContext, file: &std::path::Path) -> Result<()> {
    let content = tokio::fs::read_to_string(file)
        .await
        .with_context(|| format!("Failed to read OPML file: {}", file.display()))?;

    let parser = opml::Parser::with_max_depth(ctx.config.max_outline_depth);
    let doc = parser
        .parse_str(&content)
        .context("Failed to parse OPML file")?;

    let feeds = opml::feeds(&doc);
    if feeds.is_empty() {
        eprintln!("Warning: no valid feeds found in {}", file.display());
        return Ok(());
    }

    let subscriptions: Vec<NewSubscription> = feeds
        .into_iter()
        .map(|f| NewSubscription {
            title: f.title,
            xml_url: f.xml_url,
            html_url: f.html_url,
        })
        .collect();

    let count = subscriptions.len();
    ctx.db
        .sync_subscriptions(&subscriptions)
        .await
        .context("Failed to sync subscriptions")?;

    println!("Imported {} feeds from {}", count, file.display());
    Ok(())
}

async fn cmd_add(ctx: &AppContext, xml_url: &str) -> Result<()> {
    let url = validate_url(xml_url).map_err(|e| anyhow::anyhow!("Invalid feed URL: {}", e))?;
    let options = ctx.fetch_options();

    // Fetch first so the stored title comes from the channel itself
    let channel = feed::fetch_channel(&ctx.client, url.as_str(), options.timeout)
        .await
        .context("Failed to fetch feed")?;

    let title = if channel.title.is_empty() {
        url.as_str().to_string()
    } else {
        channel.title.clone()
    };

    let sub = match ctx.db.add_subscription(&title, url.as_str(), None).await {
        Ok(sub) => sub,
        Err(DatabaseError::DuplicateSubscription(title)) => {
            eprintln!("Duplicated subscription: {}", title);
            std::process::exit(1);
        }
        Err(e) => return Err(e).context("Failed to store subscription"),
    };

    ctx.db
        .cache_channel(url.as_str(), &channel, options.cache_ttl_minutes)
        .await
        .context("Failed to cache channel")?;

    println!("{}", serde_json::to_string_pretty(&sub)?);
    Ok(())
}

async fn cmd_list(ctx: &AppContext) -> Result<()> {
    let subs = ctx
        .db
        .list_subscriptions()
        .await
        .context("Failed to list subscriptions")?;
    println!("{}", serde_json::to_string_pretty(&subs)?);
    Ok(())
}

async fn cmd_get(ctx: &AppContext, title: &str, fresh: bool) -> Result<()> {
    let Some(sub) = ctx
        .db
        .get_subscription(title)
        .await
        .context("Failed to look up subscription")?
    else {
        eprintln!("No subscription titled: {}", title);
        std::process::exit(1);
    };

    let options = ctx.fetch_options();
    let cached = if fresh {
        None
    } else {
        ctx.db
            .cached_channel(&sub.xml_url)
            .await
            .context("Failed to read channel cache")?
    };

    let channel = match cached {
        Some(channel) => {
            tracing::debug!(title = %sub.title, "Serving channel from cache");
            channel
        }
        None => feed::fetch_and_cache(&ctx.db, &ctx.client, &sub.xml_url, &options)
            .await
            .with_context(|| format!("Failed to fetch feed: {}", sub.xml_url))?,
    };

    println!("{}", serde_json::to_string_pretty(&channel)?);
    Ok(())
}

async fn cmd_delete(ctx: &AppContext, title: &str) -> Result<()> {
    let deleted = ctx
        .db
        .delete_subscription(title)
        .await
        .context("Failed to delete subscription")?;
    if !deleted {
        eprintln!("No subscription titled: {}", title);
        std::process::exit(1);
    }
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "status": "ok",
            "title": title,
        }))?
    );
    Ok(())
}

async fn cmd_refresh(ctx: &AppContext) -> Result<()> {
    let subs = ctx
        .db
        .list_subscriptions()
        .await
        .context("Failed to list subscriptions")?;
    if subs.is_empty() {
        println!("No subscriptions to refresh.");
        return Ok(());
    }

    let total = subs.len();
    let outcomes = feed::refresh_all(
        ctx.db.clone(),
        ctx.client.clone(),
        subs,
        ctx.fetch_options(),
    )
    .await;

    let mut ok = 0;
    for outcome in &outcomes {
        match &outcome.result {
            Ok(items) => {
                ok += 1;
                println!("  {} ({} items)", outcome.title, items);
            }
            Err(e) => println!("  {} failed: {}", outcome.title, e),
        }
    }
    println!("Refreshed {}/{} subscriptions.", ok, total);

    // Refresh replaces live entries; sweep out anything left behind
    let evicted = ctx.db.evict_expired_channels().await?;
    if evicted > 0 {
        tracing::debug!(evicted = evicted, "Evicted expired cache entries");
    }
    Ok(())
}
