//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use soulseed_core::{BlogRewriter, Enricher, ItemOutcome, RewriteProgress};
use soulseed_llm::{ChatModel, OpenAiClient};
use soulseed_names::{ChunkSource, NameDatabase, audit_post, blog_stats};
use soulseed_shared::{
    AppConfig, BlogPost, BlogStats, EnrichConfig, NameRecord, RewriteConfig, init_config,
    init_config_at, load_config, load_config_from,
};
use soulseed_storage::Storage;

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// SoulSeed: baby-name research, enrichment and blog tooling.
#[derive(Parser)]
#[command(
    name = "soulseed",
    version,
    about = "Enrich baby names with LLM research and keep name blog posts complete.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.soulseed/soulseed.toml).
    #[arg(long, global = true, env = "SOULSEED_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Start the HTTP API and the weekly rewrite trigger.
    Serve {
        /// Override the configured bind address.
        #[arg(long)]
        bind: Option<String>,
    },

    /// Enrich a single name and print the result as JSON.
    Enrich {
        name: String,

        #[arg(long)]
        gender: String,

        #[arg(long)]
        origin: String,

        #[arg(long)]
        meaning: String,
    },

    /// Rewrite published blog posts that are short on names.
    Rewrite {
        /// Rewrite only this post.
        #[arg(long)]
        post: Option<String>,
    },

    /// Cross-check stored posts against the name database.
    Audit,

    /// Blog post management.
    Blogs {
        #[command(subcommand)]
        action: BlogsAction,
    },

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Blog subcommands.
#[derive(Subcommand)]
pub(crate) enum BlogsAction {
    /// Upsert posts from a JSON array file.
    Import { file: PathBuf },
    /// List stored posts with their stats.
    List,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "soulseed=info,tower_http=info",
        1 => "soulseed=debug,tower_http=debug",
        _ => "soulseed=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt().with_env_filter(env_filter).with_target(false).init();
        }
        LogFormat::Json => {
            fmt().json().with_env_filter(env_filter).init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.as_deref();
    match cli.command {
        Command::Serve { bind } => cmd_serve(config_path, bind).await,
        Command::Enrich {
            name,
            gender,
            origin,
            meaning,
        } => cmd_enrich(config_path, &name, &gender, &origin, &meaning).await,
        Command::Rewrite { post } => cmd_rewrite(config_path, post.as_deref()).await,
        Command::Audit => cmd_audit(config_path).await,
        Command::Blogs { action } => match action {
            BlogsAction::Import { file } => cmd_blogs_import(config_path, &file).await,
            BlogsAction::List => cmd_blogs_list(config_path).await,
        },
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(config_path).await,
            ConfigAction::Show => cmd_config_show(config_path).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

fn chat_model(config: &AppConfig) -> Result<Arc<dyn ChatModel>> {
    Ok(Arc::new(OpenAiClient::from_config(config)?))
}

async fn open_storage(config: &AppConfig) -> Result<Arc<Storage>> {
    Ok(Arc::new(
        Storage::open(Path::new(&config.storage.db_path)).await?,
    ))
}

async fn open_storage_readonly(config: &AppConfig) -> Result<Storage> {
    let path = Path::new(&config.storage.db_path);
    if !path.exists() {
        return Err(eyre!(
            "no database at '{}'. Import posts first with `soulseed blogs import`.",
            path.display()
        ));
    }
    Ok(Storage::open_readonly(path).await?)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config_path: Option<&Path>, bind: Option<String>) -> Result<()> {
    let mut config = resolve_config(config_path)?;
    if let Some(bind) = bind {
        config.server.bind = bind;
    }
    info!(
        bind = %config.server.bind,
        schedule = config.schedule.enabled,
        "starting server"
    );
    soulseed_api::serve(&config).await?;
    Ok(())
}

async fn cmd_enrich(
    config_path: Option<&Path>,
    name: &str,
    gender: &str,
    origin: &str,
    meaning: &str,
) -> Result<()> {
    let config = resolve_config(config_path)?;
    let record = NameRecord::from_parts(Some(name), Some(gender), Some(origin), Some(meaning))?;
    let enricher = Enricher::new(chat_model(&config)?, EnrichConfig::from(&config));

    let spinner = spinner();
    spinner.set_message(format!("Researching {}", record.name));
    let response = enricher.enrich(&record).await;
    spinner.finish_and_clear();

    let response = response?;
    if !response.verification.passed {
        warn!(
            issues = response.verification.issues.len(),
            "verification reported issues"
        );
    }
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

async fn cmd_rewrite(config_path: Option<&Path>, post: Option<&str>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let rewriter = BlogRewriter::with_default_validator(
        chat_model(&config)?,
        open_storage(&config).await?,
        RewriteConfig::from(&config),
    );

    if let Some(post_id) = post {
        let progress = CliProgress::new();
        progress.spinner.set_message(format!("Rewriting {post_id}"));
        let outcome = rewriter.rewrite_one(post_id).await;
        progress.spinner.finish_and_clear();
        print_outcome(&outcome?);
        return Ok(());
    }

    let progress = CliProgress::new();
    let summary = rewriter.rewrite_all_with_progress(&progress).await;
    progress.spinner.finish_and_clear();
    let summary = summary?;

    println!();
    for outcome in &summary.results {
        print_outcome(outcome);
    }
    println!();
    println!("  Rewrite complete");
    println!("  Posts:     {}", summary.total_posts);
    println!("  Succeeded: {}", summary.success_count);
    println!("  Failed:    {}", summary.fail_count);
    println!();
    Ok(())
}

fn print_outcome(outcome: &ItemOutcome) {
    match outcome {
        ItemOutcome::Success(s) => println!(
            "  ok    {:<40} {:>3} -> {:>3} names, {} words ({} attempt{})",
            s.title,
            s.before,
            s.after,
            s.words,
            s.attempts,
            if s.attempts == 1 { "" } else { "s" }
        ),
        ItemOutcome::Failure(f) => println!("  FAIL  {:<40} {}", f.title, f.error),
    }
}

async fn cmd_audit(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage_readonly(&config).await?;

    let mut db = NameDatabase::new(Vec::new(), ChunkSource::from_config(&config.names)?);
    if db.load_core().await.is_ok() {
        db.load_all().await?;
    }
    let status = db.status();
    info!(
        names = status.loaded_names,
        chunks = status.loaded_chunks,
        "name database loaded"
    );

    let posts = storage.list_blogs().await?;
    println!();
    println!(
        "  {:<40} {:>6} {:>8} {:>8} {:>6}",
        "TITLE", "NAMES", "MISSING", "CLAIM", "OK"
    );
    let mut flagged = 0;
    for post in &posts {
        let report = audit_post(post, &db);
        if !report.is_clean() {
            flagged += 1;
        }
        println!(
            "  {:<40} {:>6} {:>8} {:>8} {:>6}",
            truncate(&report.title, 40),
            report.unique_names.len(),
            report.missing_from_database.len(),
            report
                .title_claim
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".into()),
            if report.is_clean() { "yes" } else { "no" },
        );
    }
    println!();
    println!("  {} posts audited, {flagged} need attention", posts.len());
    println!();
    Ok(())
}

async fn cmd_blogs_import(config_path: Option<&Path>, file: &Path) -> Result<()> {
    let config = resolve_config(config_path)?;
    let raw = std::fs::read_to_string(file)
        .map_err(|e| eyre!("cannot read '{}': {e}", file.display()))?;
    let posts: Vec<BlogPost> = serde_json::from_str(&raw)
        .map_err(|e| eyre!("'{}' is not a JSON array of posts: {e}", file.display()))?;

    let storage = open_storage(&config).await?;
    for mut post in posts.iter().cloned() {
        if post.stats == BlogStats::default() {
            post.stats = blog_stats(&post.content, config.rewriter.words_per_minute);
        }
        storage.upsert_blog(&post).await?;
    }

    info!(count = posts.len(), file = %file.display(), "posts imported");
    println!("Imported {} posts into {}", posts.len(), config.storage.db_path);
    Ok(())
}

async fn cmd_blogs_list(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let storage = open_storage_readonly(&config).await?;
    let posts = storage.list_blogs().await?;

    println!();
    println!(
        "  {:<24} {:<10} {:>6} {:>6} {:>4}  TITLE",
        "ID", "STATUS", "NAMES", "WORDS", "MIN"
    );
    for post in &posts {
        println!(
            "  {:<24} {:<10} {:>6} {:>6} {:>4}  {}",
            truncate(&post.id, 24),
            post.status,
            post.stats.names_count,
            post.stats.word_count,
            post.stats.reading_time,
            post.title
        );
    }
    println!();
    println!("  {} posts", posts.len());
    Ok(())
}

async fn cmd_config_init(config_path: Option<&Path>) -> Result<()> {
    let path = match config_path {
        Some(p) => init_config_at(p)?,
        None => init_config()?,
    };
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(config_path: Option<&Path>) -> Result<()> {
    let config = resolve_config(config_path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('…');
        out
    }
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

fn spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(80));
    spinner
}

/// Rewrite progress on an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        Self { spinner: spinner() }
    }
}

impl RewriteProgress for CliProgress {
    fn item_started(&self, index: usize, total: usize, title: &str) {
        self.spinner
            .set_message(format!("Rewriting [{}/{total}] {title}", index + 1));
    }

    fn item_finished(&self, outcome: &ItemOutcome) {
        let mark = if outcome.is_success() { "done" } else { "failed" };
        self.spinner
            .println(format!("  {mark}: {}", outcome.title()));
    }
}
