use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

use overlay_assist::app::{Assistant, ScreenCapturer, install_fault_handler};
use overlay_assist::client::BackendClient;
use overlay_assist::config::{
    BackendConfig, CoordinatorConfig, DetectorConfig, PathsConfig, StreamConfig,
};
use overlay_assist::error::PermissionError;
use overlay_assist::permissions::{
    Capability, CapabilityStatus, PermissionCompletionDetector, StaticCapabilities,
};
use overlay_assist::stream::{StreamOutcome, UiEvent, UiEvents};
use overlay_assist::windows::{Preferences, WindowLevelCoordinator, WindowRegistry};

/// No display attached in headless mode.
struct NoDisplay;

#[async_trait]
impl ScreenCapturer for NoDisplay {
    async fn capture(&self) -> overlay_assist::error::Result<Vec<String>> {
        Err(PermissionError::NotGranted {
            capability: Capability::Screen,
        }
        .into())
    }
}

fn init_tracing(paths: &PathsConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_target(false).with_writer(std::io::stderr);

    match &paths.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "overlay-assist.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(stderr)
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::registry().with(filter).with(stderr).init();
            None
        }
    }
}

/// Print stream chunks to `out` and notices to stderr until the UI
/// channel closes.
fn spawn_printer<W>(events: &UiEvents, mut out: W) -> JoinHandle<()>
where
    W: Write + Send + 'static,
{
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(n)) => {
                    tracing::warn!(skipped = n, "Printer lagged behind UI events");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            match event {
                UiEvent::StreamChunk { chunk, .. } => {
                    let _ = write!(out, "{chunk}");
                    let _ = out.flush();
                }
                UiEvent::StreamComplete { .. } => {
                    let _ = writeln!(out);
                    let _ = out.flush();
                }
                UiEvent::StreamError { message, .. } => eprintln!("\nError: {message}"),
                UiEvent::UpdateNotification { message, .. } => eprintln!("{message}"),
                UiEvent::StreamStart { .. } | UiEvent::UpdateProgress { .. } => {}
            }
        }
    })
}

/// Restore windows, then close the UI channel and let the printer drain
/// whatever is still queued.
async fn finish(assistant: Arc<Assistant>, printer: JoinHandle<()>) {
    assistant.shutdown();
    drop(assistant);
    if let Err(e) = printer.await {
        tracing::warn!("Printer task failed: {e}");
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = PathsConfig::from_env();
    let _log_guard = init_tracing(&paths);

    let backend = BackendConfig::from_env().context("invalid backend configuration")?;
    eprintln!("Overlay Assist v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Backend: {}", backend.base_url);
    eprintln!("   Model: {}", backend.model);

    let registry = WindowRegistry::new();
    let preferences = Preferences::load(&paths.preferences_path);
    let detector = PermissionCompletionDetector::new(
        Arc::new(StaticCapabilities(CapabilityStatus::Unknown)),
        DetectorConfig::from_env(),
    );
    let coordinator = WindowLevelCoordinator::new(
        registry,
        preferences.clone(),
        detector,
        CoordinatorConfig::from_env(),
    );
    install_fault_handler(&coordinator);

    let client = BackendClient::new(backend, StreamConfig::from_env())
        .context("failed to build HTTP client")?;
    let events = UiEvents::new();
    let printer = spawn_printer(&events, std::io::stdout());
    let assistant = match std::env::var("OVERLAY_ASSIST_PROMPT") {
        Ok(prompt) if !prompt.trim().is_empty() => Assistant::with_custom_prompt(
            coordinator,
            preferences,
            client,
            events,
            Arc::new(NoDisplay),
            prompt,
        ),
        _ => Assistant::new(
            coordinator,
            preferences,
            client,
            events,
            Arc::new(NoDisplay),
        ),
    };

    // One-shot mode: the arguments are the prompt.
    let args: Vec<String> = std::env::args().skip(1).collect();
    if !args.is_empty() {
        let result = assistant.send_chat(&args.join(" "), None).await;
        finish(assistant, printer).await;
        let forwarded = result.map_err(|e| anyhow::anyhow!(e.user_message()))?;
        if let StreamOutcome::Failed(message) = forwarded.outcome {
            anyhow::bail!("backend error: {message}");
        }
        return Ok(());
    }

    eprintln!("   Type a message and press Enter. /pin on|off, /clear, /quit.\n");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line,
            _ = tokio::signal::ctrl_c() => Ok(None),
        };
        let line = match line {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read stdin: {e}");
                break;
            }
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                assistant.clear_history();
                eprintln!("History cleared");
            }
            "/pin on" | "/pin off" => {
                if let Err(e) = assistant.set_pinned(line == "/pin on") {
                    eprintln!("Error: {}", e.user_message());
                }
            }
            prompt => {
                // Errors were already printed from the UI event channel.
                if let Err(e) = assistant.send_chat(prompt, None).await {
                    tracing::debug!("Chat request failed: {e}");
                }
            }
        }
    }

    finish(assistant, printer).await;
    Ok(())
}
