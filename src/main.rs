use clap::Parser;
use futures::StreamExt;
use pixelforge::logger::{self, LogLevel, LoggerConfig};
use pixelforge::{
    suggestion_label, suggestions, BannerKind, Config, GenerationError, ImageClient, Quality,
    RequestCoordinator, SessionState, DEFAULT_DOWNLOAD_NAME,
};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "pixelforge")]
#[command(about = "Turn a text prompt into an image using a remote generation endpoint")]
struct Cli {
    /// Describe your image in detail
    prompt: Vec<String>,

    #[arg(long, short, default_value = "standard")]
    quality: Quality,

    /// Use one of the example prompts (1-based, see --suggestions)
    #[arg(long, conflicts_with = "prompt")]
    suggestion: Option<usize>,

    /// List the example prompts and exit
    #[arg(long, default_value_t = false)]
    suggestions: bool,

    #[arg(long, short, default_value = DEFAULT_DOWNLOAD_NAME)]
    output: PathBuf,

    /// Only print the image URL
    #[arg(long, default_value_t = false)]
    no_download: bool,

    /// Override PIXELFORGE_API_URL
    #[arg(long)]
    api_url: Option<String>,

    #[arg(long, default_value_t = false)]
    json_logs: bool,

    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[tokio::main]
async fn main() -> ExitCode {
    let dotenv_loaded = dotenv::dotenv().is_ok();
    let cli = Cli::parse();

    let mut config = Config::from_env();
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url.clone());
    }

    if let Err(e) = logger::init_with_config(logger_config(&cli, &config)) {
        eprintln!("Failed to initialise logging: {}", e);
        return ExitCode::FAILURE;
    }
    logger::log_startup_info(env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    if !dotenv_loaded {
        log::debug!("No .env file found, using system environment variables");
    }
    logger::log_config_info(&config);

    if cli.suggestions {
        println!("Example prompts:");
        for (index, suggestion) in suggestions().iter().enumerate() {
            println!("  {}. {}", index + 1, suggestion_label(suggestion));
        }
        return ExitCode::SUCCESS;
    }

    let prompt = match cli.suggestion {
        Some(index) => match index.checked_sub(1).and_then(|i| suggestions().get(i)) {
            Some(suggestion) => suggestion.to_string(),
            None => {
                eprintln!(
                    "There are {} example prompts, pick one between 1 and {}",
                    suggestions().len(),
                    suggestions().len()
                );
                return ExitCode::FAILURE;
            }
        },
        None => cli.prompt.join(" "),
    };

    match run(&cli, &config, &prompt).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: &Cli, config: &Config, prompt: &str) -> Result<(), GenerationError> {
    let client = ImageClient::new(config)?;
    let coordinator = Arc::new(RequestCoordinator::new(Arc::new(client.clone()), config));

    let watcher = tokio::spawn(render_updates(coordinator.clone()));

    let canceller = {
        let coordinator = coordinator.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                coordinator.cancel();
            }
        })
    };

    let result = coordinator.generate(prompt, cli.quality).await;
    canceller.abort();
    watcher.abort();

    let image = result?;
    println!("{}", image);

    if !cli.no_download {
        let path = client.download(&image, &cli.output).await?;
        println!("Saved to {}", path.display());
    }
    Ok(())
}

/// Prints the status line and banner whenever either changes.
async fn render_updates(coordinator: Arc<RequestCoordinator>) {
    let mut updates = coordinator.updates();
    let mut last: Option<(String, Option<String>)> = None;

    while let Some(state) = updates.next().await {
        let view = view_of(&state);
        if last.as_ref() == Some(&view) {
            continue;
        }
        if let Some(banner) = &state.banner {
            match banner.kind {
                BannerKind::Retrying => println!("… {}", banner.text),
                BannerKind::Error => println!("✖ {}", banner.text),
            }
        }
        if state.loading {
            println!("{}", view.0);
        }
        if let Some(message) = state.success_message() {
            println!("✔ {}", message);
        }
        last = Some(view);
    }
}

fn view_of(state: &SessionState) -> (String, Option<String>) {
    (
        state.status_line(),
        state.banner.as_ref().map(|b| b.text.clone()),
    )
}

fn logger_config(cli: &Cli, config: &Config) -> LoggerConfig {
    let base = if cli.json_logs {
        LoggerConfig::machine()
    } else {
        LoggerConfig::new()
    };

    let level = match cli.verbose {
        0 => config
            .log_level
            .as_deref()
            .and_then(|level| level.parse().ok())
            .unwrap_or(LogLevel::Warn),
        1 => LogLevel::Info,
        2 => LogLevel::Debug,
        _ => LogLevel::Trace,
    };

    base.with_level(level)
}
