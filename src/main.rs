use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::Result;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use nbwidget::{
    core::msg::SessionEvent,
    domain::document::Notebook,
    infrastructure::{cli::Cli, config::Config},
    integration::runtime::Runtime,
    utils::{initialize_logging, initialize_panic_handler},
};

async fn read_session(
    reader: impl AsyncBufRead + Unpin,
    sender: mpsc::UnboundedSender<SessionEvent>,
) -> Result<()> {
    let mut lines = reader.lines();
    let mut line_no = 0usize;
    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match serde_json::from_str::<SessionEvent>(line) {
            Ok(event) => sender.send(event)?,
            Err(e) => tracing::warn!("Skipping session line {line_no}: {e}"),
        }
    }
    Ok(())
}

async fn spawn_reader(
    session: Option<PathBuf>,
    sender: mpsc::UnboundedSender<SessionEvent>,
) -> Result<tokio::task::JoinHandle<Result<()>>> {
    let handle = match session {
        Some(path) => {
            let file = tokio::fs::File::open(path).await?;
            tokio::spawn(read_session(BufReader::new(file), sender))
        }
        None => tokio::spawn(read_session(BufReader::new(tokio::io::stdin()), sender)),
    };
    Ok(handle)
}

async fn tokio_main() -> Result<()> {
    initialize_logging()?;

    initialize_panic_handler()?;

    let args = <Cli as Parser>::parse();

    let mut config = Config::new()?;
    if let Some(msg_throttle) = args.msg_throttle {
        config.widgets.msg_throttle = msg_throttle;
    }
    config.validate()?;

    let mut runtime = Runtime::new(config.widgets.clone());
    runtime.install_widget_manager(Box::new(Notebook::with_cells(args.cells)))?;

    let sender = runtime
        .get_sender()
        .ok_or_else(|| color_eyre::eyre::eyre!("runtime has no event sender"))?;
    let reader = spawn_reader(args.session, sender).await?;

    runtime
        .run(|frame| match serde_json::to_string(frame) {
            Ok(json) => println!("{json}"),
            Err(e) => tracing::error!("Failed to serialize outbound frame: {e}"),
        })
        .await?;
    reader.await??;

    if args.render {
        if let Some(manager) = runtime.widget_manager() {
            print!("{}", manager.render_document());
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = tokio_main().await {
        eprintln!("{} error: Something went wrong", env!("CARGO_PKG_NAME"));
        Err(e)
    } else {
        Ok(())
    }
}
