//! Kisan - farmer advisory assistant
//!
//! Asks one question from the command line, or runs the HTTP server:
//!
//! ```text
//! kisan [--lang hi] [--user farmer-1] [--direct] "Should I sell my onions now?"
//! kisan serve [--port 8080]
//! kisan --sample-config
//! ```

use anyhow::{bail, Context};
use kisan_core::{
    config::{load_config, sample_config},
    AdvisoryMode, AdvisoryRequest, AdvisoryService, Language, OutcomeStatus,
};
use tracing_subscriber::EnvFilter;

const DEFAULT_USER: &str = "local-farmer";

/// What the invocation asks for
#[derive(Debug, PartialEq)]
enum Command {
    Ask {
        query: String,
        user_id: String,
        language: Option<Language>,
        mode: Option<AdvisoryMode>,
    },
    Serve {
        port: u16,
    },
    SampleConfig,
}

impl Command {
    /// Parse command-line arguments
    fn parse(args: impl IntoIterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = args.into_iter().peekable();

        if args.peek().map(String::as_str) == Some("serve") {
            args.next();
            let mut port = std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080);
            while let Some(arg) = args.next() {
                match arg.as_str() {
                    "--port" | "-p" => {
                        let value = args.next().context("--port needs a value")?;
                        port = value
                            .parse()
                            .with_context(|| format!("invalid port: {}", value))?;
                    }
                    other => bail!("unexpected argument: {}", other),
                }
            }
            return Ok(Command::Serve { port });
        }

        let mut words = Vec::new();
        let mut user_id = DEFAULT_USER.to_string();
        let mut language = None;
        let mut mode = None;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--sample-config" => return Ok(Command::SampleConfig),
                "--lang" | "-l" => {
                    let value = args.next().context("--lang needs a value")?;
                    language = Some(value.parse::<Language>().map_err(anyhow::Error::msg)?);
                }
                "--user" | "-u" => {
                    user_id = args.next().context("--user needs a value")?;
                }
                "--direct" => mode = Some(AdvisoryMode::Direct),
                "--agents" => mode = Some(AdvisoryMode::MultiAgent),
                _ if !arg.starts_with('-') => words.push(arg),
                other => bail!("unknown flag: {}", other),
            }
        }

        let query = words.join(" ");
        if query.trim().is_empty() {
            bail!("usage: kisan [--lang CODE] [--user ID] [--direct] \"question\" | kisan serve [--port N]");
        }

        Ok(Command::Ask {
            query,
            user_id,
            language,
            mode,
        })
    }
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("kisan_core=warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Command::parse(std::env::args().skip(1))? {
        Command::SampleConfig => {
            print!("{}", sample_config());
            Ok(())
        }
        Command::Serve { port } => serve(port).await,
        Command::Ask {
            query,
            user_id,
            language,
            mode,
        } => {
            init_tracing();
            ask(query, user_id, language, mode).await
        }
    }
}

#[cfg(feature = "web")]
async fn serve(port: u16) -> anyhow::Result<()> {
    kisan_server::run_server(port).await
}

#[cfg(not(feature = "web"))]
async fn serve(_port: u16) -> anyhow::Result<()> {
    bail!("built without the `web` feature")
}

async fn ask(
    query: String,
    user_id: String,
    language: Option<Language>,
    mode: Option<AdvisoryMode>,
) -> anyhow::Result<()> {
    let cwd = std::env::current_dir()?;
    let config = load_config(&cwd).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "using default configuration");
        Default::default()
    });
    let service = AdvisoryService::new(config)?;

    let mut request = AdvisoryRequest::new(query, user_id);
    request.language = language;
    request.mode = mode;

    match service.advise(request).await {
        Ok(response) => {
            println!("{}", response.advice_text);
            if !response.specialists.is_empty() {
                eprintln!();
                for outcome in &response.specialists {
                    match (&outcome.status, &outcome.error) {
                        (OutcomeStatus::Failed, Some(error)) => {
                            eprintln!("  ✗ {} (turn {}): {}", outcome.tool, outcome.turn, error)
                        }
                        _ => eprintln!("  ✓ {} (turn {})", outcome.tool, outcome.turn),
                    }
                }
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(error = %e, "advisory failed");
            eprintln!("{}", service.failure_message(language));
            std::process::exit(1);
        }
    }
}
