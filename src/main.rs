use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ripple::api::{ApiClient, ClientConfig, RetryPolicy, Visibility};
use ripple::config::Config;
use ripple::feed::{FeedController, FeedPhase, FilterSpec, SortKey, SortOrder};
use secrecy::SecretString;
use std::path::PathBuf;
use std::time::Duration;

/// Get the config file path (~/.config/ripple/config.toml)
fn get_config_path() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    Ok(PathBuf::from(home)
        .join(".config")
        .join("ripple")
        .join("config.toml"))
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SortByArg {
    CreatedAt,
    Likes,
    Views,
    Comments,
}

impl From<SortByArg> for SortKey {
    fn from(arg: SortByArg) -> Self {
        match arg {
            SortByArg::CreatedAt => SortKey::CreatedAt,
            SortByArg::Likes => SortKey::Likes,
            SortByArg::Views => SortKey::Views,
            SortByArg::Comments => SortKey::Comments,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OrderArg {
    Asc,
    Desc,
}

impl From<OrderArg> for SortOrder {
    fn from(arg: OrderArg) -> Self {
        match arg {
            OrderArg::Asc => SortOrder::Asc,
            OrderArg::Desc => SortOrder::Desc,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum VisibilityArg {
    Public,
    Private,
    Friends,
}

impl From<VisibilityArg> for Visibility {
    fn from(arg: VisibilityArg) -> Self {
        match arg {
            VisibilityArg::Public => Visibility::Public,
            VisibilityArg::Private => Visibility::Private,
            VisibilityArg::Friends => Visibility::Friends,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "ripple", about = "Terminal client for the Ripple social feed")]
struct Args {
    /// Full-text search over post content and category
    #[arg(long)]
    search: Option<String>,

    /// Restrict to a single category
    #[arg(long)]
    category: Option<String>,

    /// Restrict to a visibility level
    #[arg(long)]
    visibility: Option<VisibilityArg>,

    /// Require a tag (repeatable)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Sort column
    #[arg(long, value_enum, default_value = "created-at")]
    sort_by: SortByArg,

    /// Sort direction
    #[arg(long, value_enum, default_value = "desc")]
    order: OrderArg,

    /// Number of pages to fetch (follows the server's has_next)
    #[arg(long, default_value_t = 1)]
    pages: u32,

    /// Like a post by id and exit
    #[arg(long, value_name = "POST_ID")]
    like: Option<i64>,

    /// List available categories and exit
    #[arg(long)]
    categories: bool,

    /// List popular tags and exit
    #[arg(long)]
    popular_tags: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let config_path = get_config_path()?;
    let config = Config::load(&config_path).context("Failed to load configuration")?;

    // Env var takes precedence over the config file for the credential
    let token = std::env::var("RIPPLE_TOKEN")
        .ok()
        .or_else(|| config.auth_token.clone())
        .unwrap_or_default();
    if token.is_empty() {
        tracing::warn!("No auth token configured; mutating requests will be rejected");
    }

    let client = ApiClient::new(ClientConfig {
        base_url: config.api_base_url.clone(),
        auth_token: SecretString::from(token),
        retry: RetryPolicy {
            timeout: Duration::from_secs(config.timeout_secs),
            max_retries: config.max_retries,
            backoff_base: Duration::from_secs(1),
        },
    })
    .context("Failed to create API client")?;

    let mut controller = FeedController::new(client, config.page_size);

    if args.categories {
        let categories = controller
            .categories()
            .await
            .context("Failed to fetch categories")?;
        for category in categories {
            println!("{}", category);
        }
        return Ok(());
    }

    if args.popular_tags {
        let tags = controller
            .popular_tags()
            .await
            .context("Failed to fetch popular tags")?;
        for tag in tags {
            println!("#{}", tag);
        }
        return Ok(());
    }

    if let Some(post_id) = args.like {
        let likes_count = controller
            .like(post_id)
            .await
            .with_context(|| format!("Failed to like post {}", post_id))?;
        println!("Post {} now has {} likes", post_id, likes_count);
        return Ok(());
    }

    let spec = FilterSpec {
        search: args.search.unwrap_or_default(),
        category: args.category.unwrap_or_default(),
        visibility: args.visibility.map(Visibility::from),
        tags: args.tags,
        sort_by: args.sort_by.into(),
        sort_order: args.order.into(),
    };

    // A default spec equals the controller's initial filter, so set_filter
    // short-circuits; fall back to an explicit refresh for the initial load.
    let request = match controller.set_filter(spec) {
        Some(request) => request,
        None => controller.refresh(),
    };
    controller.run(request).await;

    // Keep pulling pages as if the sentinel stayed visible at the bottom
    for _ in 1..args.pages {
        match controller.on_sentinel(true) {
            Some(request) => controller.run(request).await,
            None => break,
        }
    }

    if let FeedPhase::Error(message) = &controller.state().phase {
        anyhow::bail!("Failed to load feed: {}", message);
    }
    if let Some(message) = &controller.state().transient_error {
        eprintln!("warning: some pages failed to load: {}", message);
    }

    let state = controller.state();
    if state.posts.is_empty() {
        println!("No posts match the current filters.");
        return Ok(());
    }

    for post in &state.posts {
        println!("#{} by user {} at {}", post.id, post.user_id, post.created_at);
        if let Some(category) = &post.category {
            println!("  category: {}", category);
        }
        if !post.tags.is_empty() {
            println!("  tags: {}", post.tags.join(", "));
        }
        println!(
            "  {} likes, {} comments, {} views",
            post.likes_count, post.comments_count, post.views_count
        );
        println!("  {}", post.content);
        println!();
    }

    if let Some(pagination) = &state.pagination {
        println!(
            "Showing {} of {} posts (page {} of {})",
            state.posts.len(),
            pagination.total,
            pagination.page,
            pagination.pages
        );
    }

    Ok(())
}
