use std::{path::PathBuf, time::Duration};

use anyhow::Result;
use clap::Parser;
use client_core::{
    connect_session,
    gateway::{DEFAULT_REQUEST_TIMEOUT, DEFAULT_SERVER_URL},
    session::{DEFAULT_PLACEHOLDER, DEFAULT_SAVE_FOLDER},
    GatewayConfig, Message, SessionConfig, SessionEvent, SubmitError,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
};
use tracing::warn;

#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "IMAGE_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server_url: String,
    #[arg(long, env = "IMAGE_SAVE_FOLDER", default_value = DEFAULT_SAVE_FOLDER)]
    save_folder: PathBuf,
    #[arg(long, env = "IMAGE_REQUEST_TIMEOUT_SECS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_secs())]
    timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("warn")
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let session = connect_session(
        GatewayConfig {
            server_url: args.server_url,
            request_timeout: Duration::from_secs(args.timeout_secs),
        },
        SessionConfig {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            save_folder: args.save_folder,
        },
    )?;

    let printer = tokio::spawn(print_events(session.subscribe_events()));
    println!("{DEFAULT_PLACEHOLDER}");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut pending = None;
    while let Some(line) = lines.next_line().await? {
        match session.submit(&line).await {
            Ok(handle) => pending = Some(handle),
            Err(SubmitError::EmptyPrompt) => println!("! {}", SubmitError::EmptyPrompt),
            Err(SubmitError::Busy) => println!("! {}, please wait", SubmitError::Busy),
        }
    }

    if let Some(handle) = pending {
        if let Err(err) = handle.await {
            warn!(error = %err, "generation task ended abnormally");
        }
    }
    drop(session);
    let _ = printer.await;
    Ok(())
}

async fn print_events(mut events: broadcast::Receiver<SessionEvent>) {
    loop {
        match events.recv().await {
            Ok(SessionEvent::MessageAppended(Message::Text { content, .. })) => {
                println!("you> {content}");
            }
            Ok(SessionEvent::MessageAppended(Message::Image { bytes, .. })) => {
                println!("image> received {} bytes", bytes.len());
            }
            Ok(SessionEvent::StateChanged { input_enabled, .. }) => {
                if !input_enabled {
                    println!("... generating");
                }
            }
            Ok(SessionEvent::GenerationFailed(err)) => println!("error> {err}"),
            Ok(SessionEvent::ImageSaved(path)) => println!("saved> {}", path.display()),
            Ok(SessionEvent::ImageSaveFailed(reason)) => println!("save failed> {reason}"),
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "event printer fell behind"),
            Err(RecvError::Closed) => break,
        }
    }
}
