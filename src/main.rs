use std::{
    fs,
    path::{Path, PathBuf},
    sync::{atomic::Ordering, Arc},
};

use anyhow::{anyhow, Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use routeprobe::config::{load_config, SettingsBuilder};
use routeprobe::executor::{print_outcome, ReqwestTransport, RequestExecutor};
use routeprobe::params::ParamValues;
use routeprobe::route::{default_body_text, HttpMethod, RouteDescriptor, SchemaCatalog};
use routeprobe::session::{TestInput, TestSession};

#[derive(Parser, Debug)]
#[command(
    name = "routeprobe",
    version,
    about = "Send requests against documented API routes and summarise the results",
    disable_help_subcommand = true
)]
struct Cli {
    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    #[arg(value_name = "METHOD")]
    method: String,

    /// Route URL template, e.g. /users/:id
    #[arg(value_name = "URL")]
    url: String,

    /// Path parameter value (repeatable)
    #[arg(short = 'p', long = "param", value_name = "NAME=VALUE", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Request headers as a JSON object
    #[arg(short = 'H', long)]
    headers: Option<String>,

    /// Request body as JSON (POST, PUT and PATCH only)
    #[arg(short = 'd', long)]
    body: Option<String>,

    /// Number of times to send the request (1-1000)
    #[arg(short = 'n', long, default_value_t = 1)]
    count: u32,

    /// Requests allowed in flight at once (default: one at a time)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Per-request timeout in milliseconds
    #[arg(long = "timeout-ms")]
    timeout_ms: Option<u64>,

    /// Base URL prepended to the route
    #[arg(short = 'b', long = "base-url")]
    base_url: Option<String>,

    /// Select a profile from routeprobe.json
    #[arg(short = 'P', long)]
    profile: Option<String>,

    /// Directory or file containing routeprobe.json
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validation schema catalog (JSON) used to pre-fill the body
    #[arg(long)]
    schemas: Option<PathBuf>,

    /// Validator name to look up in --schemas
    #[arg(long, requires = "schemas")]
    validator: Option<String>,

    /// Print the outcome as JSON
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let cwd = std::env::current_dir()?;
    let config_target = cli
        .config
        .as_ref()
        .map(|p| resolve_relative(&cwd, p))
        .unwrap_or_else(|| cwd.clone());
    let cfg = load_config(&config_target).context("loading configuration")?;

    let settings = SettingsBuilder::new(cfg, cli.profile.clone())
        .base_url(cli.base_url.clone())
        .timeout_ms(cli.timeout_ms)
        .concurrency(cli.concurrency)
        .build()?;

    let method: HttpMethod = cli.method.parse()?;
    let mut route = RouteDescriptor::new(method, cli.url.clone());
    if let Some(validator) = &cli.validator {
        route = route.with_validator(validator.clone());
    }

    let body_text = match (&cli.body, &cli.schemas) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => {
            let schemas = load_schemas(&resolve_relative(&cwd, path))?;
            default_body_text(&route, &schemas)
        }
        (None, None) => String::new(),
    };

    let input = TestInput {
        params: cli.params.iter().cloned().collect::<ParamValues>(),
        headers_text: cli.headers.clone().unwrap_or_default(),
        body_text,
        count: cli.count,
    };

    let executor = RequestExecutor::new(Arc::new(ReqwestTransport::new()));
    let mut session = TestSession::new(executor, &settings);

    let cancel = session.cancel_flag();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            cancel.store(true, Ordering::SeqCst);
        }
    });

    let bar = (input.count > 1 && !cli.json).then(|| progress_bar(input.count));
    let outcome = session
        .send_with_progress(&route, &input, |progress| {
            if let Some(bar) = &bar {
                bar.set_position(u64::from(progress.completed));
            }
        })
        .await;
    if let Some(bar) = &bar {
        if outcome.is_cancelled() {
            bar.abandon();
        } else {
            bar.finish_and_clear();
        }
    }

    if cli.json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print_outcome(outcome);
    }

    if outcome.is_error() {
        std::process::exit(2);
    }
    Ok(())
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("routeprobe=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("routeprobe=warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn progress_bar(total: u32) -> ProgressBar {
    let bar = ProgressBar::new(u64::from(total));
    if let Ok(style) = ProgressStyle::with_template("{spinner} [{bar:30}] {pos}/{len} requests {elapsed}") {
        bar.set_style(style.progress_chars("=> "));
    }
    bar
}

fn load_schemas(path: &Path) -> Result<SchemaCatalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("reading schemas {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing schemas {}", path.display()))
}

fn parse_key_value(raw: &str) -> Result<(String, String)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected NAME=VALUE, got `{raw}`"))?;
    let name = name.trim().trim_start_matches(':');
    if name.is_empty() {
        return Err(anyhow!("parameter name is empty in `{raw}`"));
    }
    Ok((name.to_string(), value.to_string()))
}

fn resolve_relative(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
