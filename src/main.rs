use anyhow::{Context, Result};
use clap::Parser;
use folio_voice::{
    create_router, AppState, Capabilities, CaptureBackendFactory, Config, ConsolePlayback,
    ConversationController, Intent, RandomClientIds, WebSocketTransport,
};
use tracing::{info, warn};

/// Voice assistant for the portfolio panel
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Configuration file (extension optional)
    #[arg(short, long, default_value = "config/folio-voice")]
    config: String,

    /// Serve the HTTP control API
    #[arg(long)]
    serve: bool,

    /// Do not open the assistant session on startup
    #[arg(long)]
    no_open: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout carries the spoken replies
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));
    info!("Assistant service: {}", cfg.transport.base_url);

    let capabilities = Capabilities {
        capture: CaptureBackendFactory::create(cfg.capture.source),
        playback: Box::new(ConsolePlayback::new(
            cfg.playback.voices.clone(),
            cfg.speech_params(),
            cfg.playback.words_per_minute,
        )),
        transport: Box::new(WebSocketTransport::new()),
        client_ids: Box::new(RandomClientIds),
    };

    let controller = ConversationController::spawn(cfg.session_config(), capabilities);

    let mut snapshots = controller.subscribe();
    tokio::spawn(async move {
        let mut last_error = None;
        while snapshots.changed().await.is_ok() {
            let snapshot = snapshots.borrow_and_update().clone();
            if snapshot.last_error != last_error {
                if let Some(error) = &snapshot.last_error {
                    warn!("Assistant: {}", error);
                }
                last_error = snapshot.last_error;
            }
        }
    });

    if !args.no_open {
        controller.send(Intent::Open)?;
        info!("Type a line and press enter to speak to the assistant");
    }

    if args.serve {
        let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
        let listener = tokio::net::TcpListener::bind(&addr)
            .await
            .with_context(|| format!("Failed to bind {}", addr))?;
        info!("HTTP API listening on {}", addr);

        let app = create_router(AppState::new(controller.clone()));
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = tokio::signal::ctrl_c().await;
            })
            .await?;
    } else {
        tokio::signal::ctrl_c().await?;
    }

    info!("Shutting down");
    controller.shutdown()?;
    controller.stopped().await;

    Ok(())
}
