//! page-scribe
//!
//! Records page interaction sessions. Clicks and URL changes arrive as
//! JSON lines on stdin, captured snippets accumulate in an in-memory
//! buffer, and the joined session data is available on demand or through
//! the clipboard.

mod config;
mod coordinator;
mod logging;
mod observer;
mod page;
mod panel;
mod stdio;

use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};

use config::Config;
use coordinator::create_coordinator;
use observer::Observer;
use page::Page;
use panel::{Clipboard, ControlPanel, SystemClipboard};
use stdio::StdioBridge;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    if args.iter().any(|a| a == "--version" || a == "-V") {
        println!("page-scribe {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    // Initialize logging
    let _guard = logging::init_logging()?;

    info!("page-scribe starting...");

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded from {:?}", config.config_path());

    // Create the coordinator and spawn its message loop
    let (coordinator, handle) = create_coordinator();
    let coordinator_task = tokio::spawn(coordinator.run());

    // Set up Ctrl+C handler that requests shutdown
    let ctrl_c_handle = handle.clone();
    ctrlc::set_handler(move || {
        info!("Ctrl+C received, shutting down...");
        ctrl_c_handle.shutdown();
    })?;

    // Build the page model and connect an observer to it. The observer
    // subscribes before any session can start so no capture signal is lost.
    let page = Arc::new(Page::new(config.page.initial_url.clone()));
    let observer = Observer::connect(page.clone(), handle.clone()).await;
    let observer_signals = handle.subscribe();
    let observer_task = tokio::spawn(observer.run(observer_signals));

    // Control panel with the system clipboard when one is available
    let clipboard = match SystemClipboard::new() {
        Ok(clipboard) => Some(Box::new(clipboard) as Box<dyn Clipboard>),
        Err(e) => {
            warn!("Clipboard unavailable: {}", e);
            None
        }
    };
    let mut panel = ControlPanel::new(handle.clone(), clipboard, config.panel.copy_on_stop);
    panel.sync_view().await;

    if config.recording.autostart_on_launch {
        info!("Autostart recording on launch enabled");
        if panel.start().await.is_none() {
            error!("Failed to autostart recording");
        }
    }

    // Bridge stdin/stdout to the coordinator, panel, and page
    let bridge = StdioBridge::new(
        handle.clone(),
        panel,
        page,
        Duration::from_millis(config.panel.poll_interval_ms),
    );
    if let Err(e) = bridge.run().await {
        error!("Stdio bridge error: {}", e);
    }

    // Stop the coordinator (in case stdin closed without a shutdown)
    handle.shutdown();
    let _ = coordinator_task.await;
    let _ = observer_task.await;

    info!("Shutdown complete");
    Ok(())
}

fn print_help() {
    println!("page-scribe - Page interaction session recorder");
    println!();
    println!("USAGE:");
    println!("    page-scribe [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -h, --help       Print this help message");
    println!("    -V, --version    Print the version");
    println!();
    println!("INPUT:");
    println!("    One JSON document per stdin line. Session commands carry an");
    println!("    \"action\" field (startRecording, stopRecording, recordEvent,");
    println!("    getStatus, getCount, getData, reset, copyData); simulated page");
    println!("    activity carries an \"event\" field (click, pushState,");
    println!("    replaceState, back, forward, hashChange). Replies and count");
    println!("    updates are printed to stdout, one JSON document per line.");
    println!();
    println!("ENVIRONMENT:");
    println!("    RUST_LOG                Set log level (e.g., debug, info, warn)");
    println!("    PAGE_SCRIBE_LOG_PATH    Override the log directory");
}
