use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::Parser;
use eitaa_relay_core::{
    ChatTarget, ComposeConfig, Document, ExtractConfig, FetchConfig, Ledger, MediaStager, Relay, TelegramSender,
    archive_page, channel_url, extract_posts, fetch_channel_page, fetch_file, plan, write_posts,
};
use owo_colors::OwoColorize;
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const TOTAL_STEPS: usize = 5;

/// Relay new posts from a public Eitaa channel to a Telegram chat
#[derive(Parser, Debug)]
#[command(name = "eitaa-relay")]
#[command(version)]
#[command(about = "Relay new Eitaa channel posts to Telegram", long_about = None)]
struct Args {
    /// Eitaa channel username (e.g. m_ahlebeit)
    #[arg(short, long, env = "USERNAME", value_name = "NAME")]
    username: String,

    /// JSON file receiving the extracted posts
    #[arg(short, long, env = "OUTPUT", default_value = "posts.json", value_name = "FILE")]
    output: PathBuf,

    /// Telegram bot token
    #[arg(long, env = "TELEGRAM_TOKEN", value_name = "TOKEN", hide_env_values = true)]
    telegram_token: Option<String>,

    /// Telegram chat id, or @channel username
    #[arg(long, env = "TELEGRAM_CHAT_ID", value_name = "CHAT", allow_hyphen_values = true)]
    telegram_chat_id: Option<String>,

    /// File storing the ids of posts already sent
    #[arg(long, env = "SENT_IDS_FILE", default_value = "sent_ids.json", value_name = "FILE")]
    sent_ids_file: PathBuf,

    /// File receiving the raw channel page
    #[arg(long, env = "RAW_HTML_FILE", default_value = "channel_page.html", value_name = "FILE")]
    raw_html_file: PathBuf,

    /// Read the channel page from a saved HTML file instead of fetching it
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Origin of the channel site
    #[arg(long, default_value = "https://eitaa.com", value_name = "URL")]
    base_url: Url,

    /// Download images into this directory and upload them instead of passing URLs
    #[arg(long, env = "MEDIA_DIR", value_name = "DIR")]
    media_dir: Option<PathBuf>,

    /// Send only the post text, without forwarded/reply/date lines
    #[arg(long)]
    no_footer: bool,

    /// Escape messages for Telegram MarkdownV2
    #[arg(long)]
    escape_markdown: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "30", value_name = "SECS")]
    timeout: u64,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Extract and report what would be sent without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,eitaa_relay_core={0},eitaa_relay={0}", level)));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Parses the downstream chat, which a real run cannot do without.
fn resolve_target(args: &Args) -> anyhow::Result<Option<(String, ChatTarget)>> {
    if args.dry_run {
        return Ok(None);
    }

    let Some(token) = args.telegram_token.clone().filter(|t| !t.is_empty()) else {
        bail!("Missing required value for TELEGRAM_TOKEN (--telegram-token)");
    };
    let Some(chat_id) = args.telegram_chat_id.as_deref().filter(|c| !c.is_empty()) else {
        bail!("Missing required value for TELEGRAM_CHAT_ID (--telegram-chat-id)");
    };
    let target: ChatTarget = chat_id.parse().context("Invalid Telegram chat ID")?;

    Ok(Some((token, target)))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let args = Args::parse();
    init_tracing(args.verbose);

    if let Err(e) = dotenv {
        tracing::debug!(error = %e, "no .env file loaded");
    }

    if args.verbose {
        echo::print_banner();
        echo::print_info(&format!("Channel: {}", args.username));
        eprintln!();
    }

    let delivery = resolve_target(&args)?;

    if args.verbose {
        echo::print_step(1, TOTAL_STEPS, "Loading sent-ledger");
    }
    let ledger = Ledger::load(&args.sent_ids_file)
        .with_context(|| format!("Failed to load sent post IDs from {}", args.sent_ids_file.display()))?;
    if args.verbose {
        eprintln!("  {} {}\n", "Known posts:".dimmed(), ledger.len().to_string().bright_white());
    }

    let fetch_config = FetchConfig {
        timeout: args.timeout,
        user_agent: args.user_agent.clone().unwrap_or_else(|| FetchConfig::default().user_agent),
    };

    let html = match &args.input {
        Some(path) => {
            if args.verbose {
                echo::print_step(2, TOTAL_STEPS, &format!("Reading from file {}", path.display().bright_white()));
            }
            fetch_file(path).with_context(|| format!("Failed to read file: {}", path.display()))?
        }
        None => {
            let url = channel_url(&args.base_url, &args.username).context("Invalid channel URL")?;
            if args.verbose {
                echo::print_step(2, TOTAL_STEPS, &format!("Fetching from {}", url.as_str().bright_white().underline()));
            }

            let page = fetch_channel_page(&url, &fetch_config).await.context("Failed to fetch channel page")?;
            archive_page(&args.raw_html_file, &page.body)
                .with_context(|| format!("Failed to save raw HTML to {}", args.raw_html_file.display()))?;
            page.into_body().context("Failed to fetch channel page")?
        }
    };

    if args.verbose {
        eprintln!("  {} {}\n", "Size:".dimmed(), echo::format_size(html.len()).bright_white());
        echo::print_step(3, TOTAL_STEPS, "Extracting posts");
    }

    let doc = Document::parse(&html).context("Failed to parse HTML")?;
    let extract_config = ExtractConfig { base_url: args.base_url.clone(), ..Default::default() };
    let posts = extract_posts(&doc, &args.username, &extract_config).context("Failed to extract posts")?;

    if args.verbose {
        if let Some(title) = doc.title() {
            eprintln!("  {} {}", "Title:".dimmed(), title.bright_white());
        }
        eprintln!("  {} {}\n", "Posts:".dimmed(), posts.len().to_string().bright_white());
        echo::print_step(4, TOTAL_STEPS, "Writing posts");
    }

    write_posts(&args.output, &posts).with_context(|| format!("Failed to write JSON to {}", args.output.display()))?;
    echo::print_success(&format!(
        "{} posts written to {}",
        posts.len(),
        args.output.display().bright_white()
    ));

    let compose_config =
        ComposeConfig { include_footer: !args.no_footer, escape_markdown: args.escape_markdown, base_url: args.base_url };

    let Some((token, target)) = delivery else {
        echo::print_plan(&plan(&posts, &args.username, &compose_config, &ledger));
        return Ok(());
    };

    if args.verbose {
        echo::print_step(5, TOTAL_STEPS, &format!("Delivering to {}", target.to_string().bright_white()));
    }

    let sender = TelegramSender::new(token, &fetch_config).context("Telegram client init failed")?;
    let mut relay = Relay::new(sender, target, args.username.as_str(), ledger).with_compose_config(compose_config);
    if let Some(dir) = &args.media_dir {
        let stager = MediaStager::new(dir, &fetch_config).context("Media downloader init failed")?;
        relay = relay.with_media_stager(stager);
    }

    let report = relay.run(&posts).await;
    echo::print_summary(&report);

    Ok(())
}
