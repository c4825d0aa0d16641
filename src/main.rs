//! errand: shopping agent CLI entry point.

mod cli;

use clap::Parser;
use errand::agent::{AgentEvent, QuestionPrompt};
use errand::api::ApiClient;
use errand::build_info;
use errand::config::{load_config_with_diagnostics, Config};
use errand::demo;
use errand::host::SimulatedHost;
use errand::page::{ActionExecutor, PageProcess, Site};
use errand::render::EventPrinter;
use errand::router::{spawn_background, BackgroundDeps};
use errand::tools::ToolRegistry;
use std::io::{Stderr, Stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

type Printer = EventPrinter<Stdout, Stderr>;

#[tokio::main]
async fn main() {
    let args = cli::Args::parse();
    init_tracing(args.verbose);
    info!("{}", build_info::build_line());

    let mut printer = EventPrinter::stdio(!args.no_color);
    match run(args, &mut printer).await {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(message) => {
            let _ = printer.error(&message);
            std::process::exit(1);
        }
    }
}

/// Logs go to stderr; `RUST_LOG` wins over `-v`.
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(match verbose {
            0 => "warn",
            1 => "errand=debug",
            _ => "errand=trace",
        })
    });
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Storefront pages plus where the run should start.
struct Storefront {
    process: PageProcess,
    home: String,
}

fn storefront(args: &cli::Args, config: &mut Config) -> Result<Storefront, String> {
    if args.demo {
        config.agent.site_name = "Pizza Town".to_string();
        config.agent.home_url = Some(demo::HOME_URL.to_string());
        return Ok(Storefront {
            process: demo::page_process(),
            home: demo::HOME_URL.to_string(),
        });
    }

    let Some(first) = args.pages.first() else {
        return Err("nothing to shop on: pass --demo or at least one --page URL=PATH".to_string());
    };
    let mut site = Site::new();
    for page in &args.pages {
        let html = std::fs::read_to_string(&page.path)
            .map_err(|err| format!("failed to read {}: {err}", page.path.display()))?;
        site.insert(&page.url, html);
    }
    let home = config
        .agent
        .home_url
        .get_or_insert_with(|| first.url.clone())
        .clone();
    Ok(Storefront {
        process: PageProcess::new(site),
        home,
    })
}

async fn run(args: cli::Args, printer: &mut Printer) -> Result<bool, String> {
    let loaded = load_config_with_diagnostics(args.config.as_deref()).map_err(|e| e.to_string())?;
    for warning in &loaded.diagnostics.warnings {
        let _ = printer.warn(warning);
    }
    let mut config = loaded.config;
    if let Some(model) = &args.model {
        config.api.model = model.clone();
    }
    if let Some(url) = &args.backend_url {
        config.api.backend_url = url.clone();
    }
    if let Some(max) = args.max_iterations {
        config.agent.max_iterations = max.max(1);
    }

    let Storefront { process, home } = storefront(&args, &mut config)?;
    let executor = ActionExecutor::new(config.page.settle_delays())
        .with_snapshot_tokens(config.agent.snapshot_max_tokens);
    let tab = process
        .with_executor(executor)
        .spawn(config.page.request_timeout());
    let host = SimulatedHost::new(tab)
        .with_home(home)
        .with_open_settle(Duration::from_millis(config.page.open_settle_ms));
    let client = ApiClient::new(&config.api);
    debug!(mode = client.mode().label(), model = %config.api.model, "model client ready");

    let (handle, mut events) = spawn_background(BackgroundDeps {
        config,
        client: Arc::new(client),
        host: Arc::new(host),
        tools: ToolRegistry::storefront(),
    });
    handle
        .send_message(args.prompt.clone())
        .await
        .map_err(|e| e.to_string())?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;
    let mut pending: Option<QuestionPrompt> = None;

    loop {
        tokio::select! {
            event = events.recv() => {
                let Some(event) = event else {
                    return Err("agent stopped unexpectedly".to_string());
                };
                printer.render(&event).map_err(|e| e.to_string())?;
                match event {
                    AgentEvent::AskUser(notice) => pending = Some(QuestionPrompt::from(notice)),
                    AgentEvent::AgentDone(done) => return Ok(done.error.is_none()),
                    _ => {}
                }
            }
            line = stdin.next_line(), if stdin_open && pending.is_some() => {
                match line {
                    Ok(Some(line)) => {
                        if let Some(question) = pending.take() {
                            let answer = question.answer_from_input(&line);
                            handle.answer(question.id, answer).await.map_err(|e| e.to_string())?;
                        }
                    }
                    Ok(None) | Err(_) => {
                        // Nobody left to answer: stop instead of waiting forever.
                        stdin_open = false;
                        let _ = printer.warn("input closed; stopping");
                        handle.stop().await.map_err(|e| e.to_string())?;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                let _ = printer.warn("stopping...");
                handle.stop().await.map_err(|e| e.to_string())?;
            }
        }
    }
}
