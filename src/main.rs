//! SignSight Core - Main Entry Point
//!
//! Headless runner: loads the model in the background, drives the detection
//! loop and logs what a presentation layer would display. Stdin commands:
//! Enter / `t` toggles detection, `s` prints state, `q` quits.

mod api;
mod logic;
mod constants;

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::error::RecvError;

use api::commands;
use logic::config::DetectorConfig;
use logic::context::DetectionContext;
use logic::detection_loop::DetectionLoop;
use logic::events::DetectionEvent;
use logic::frame::{self, FramePreprocessor};
use logic::labels::LabelSet;
use logic::model::ModelLoader;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    let config = DetectorConfig::from_env();
    let labels = LabelSet::load_or_default(config.labels_file.as_deref());
    log::info!("{} gesture labels", labels.len());

    let ctx = Arc::new(DetectionContext::new(labels, config.error_ttl));

    // Presenter: log what the UI would show
    let presenter = tokio::spawn(present(ctx.clone()));

    // Model acquisition runs beside the idle loop
    let loader = ModelLoader::new(&config);
    tokio::spawn({
        let ctx = ctx.clone();
        async move {
            let state = loader.load(ctx).await;
            log::info!("Model state: {:?}", state);
        }
    });

    let frames = frame::open_default_source(&config);
    let detection = DetectionLoop::new(
        ctx.clone(),
        frames,
        FramePreprocessor::square(config.input_size),
        config.refresh_interval(),
    )
    .spawn();

    if config.auto_start {
        commands::start_detection(&ctx);
    }

    log::info!("Commands: <enter>/t = toggle, s = status, q = quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => match line.trim() {
                "q" | "quit" => break,
                "s" | "status" => {
                    match commands::get_detection_state_json(&ctx) {
                        Ok(json) => println!("{}", json),
                        Err(e) => log::error!("State serialization failed: {}", e),
                    }
                    match commands::get_engine_status_json(&ctx) {
                        Ok(json) => println!("{}", json),
                        Err(e) => log::error!("Status serialization failed: {}", e),
                    }
                }
                "" | "t" | "toggle" => {
                    let detecting = commands::toggle_detection(&ctx);
                    log::info!("Detection {}", if detecting { "on" } else { "off" });
                }
                other => log::warn!("Unknown command: {}", other),
            },
            Ok(None) => {
                // stdin closed: keep running until interrupted
                if let Err(e) = tokio::signal::ctrl_c().await {
                    log::error!("Failed to wait for Ctrl-C: {}", e);
                }
                break;
            }
            Err(e) => {
                log::error!("Failed to read stdin: {}", e);
                break;
            }
        }
    }

    commands::stop_detection(&ctx);
    detection.abort();
    presenter.abort();
    log::info!("{} stopped", constants::APP_NAME);
}

async fn present(ctx: Arc<DetectionContext>) {
    let mut events = ctx.subscribe();
    loop {
        match events.recv().await {
            Ok(DetectionEvent::PredictionUpdated { prediction }) => {
                log::info!(
                    "Prediction: {} ({:.0}%)",
                    prediction.label,
                    prediction.confidence * 100.0
                );
            }
            Ok(DetectionEvent::ErrorRaised { message, severity }) => {
                log::warn!("[{:?}] {}", severity, message);
            }
            Ok(event) => log::debug!("{}", event.name()),
            Err(RecvError::Lagged(missed)) => log::debug!("Presenter skipped {} events", missed),
            Err(RecvError::Closed) => break,
        }
    }
}
