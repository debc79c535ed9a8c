//! LabSeq Daemon - RESP server for labseq evaluation

mod dto;
mod handler;
mod resp;

use anyhow::Result;
use bytes::BytesMut;
use clap::Parser;
use labseq::SequenceCache;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{error, info, warn};

use crate::handler::CommandHandler;
use crate::resp::RespValue;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "127.0.0.1:6380")]
    bind: String,

    /// Cache entries to reserve up front
    #[arg(short, long, default_value_t = 1024)]
    capacity: usize,

    /// Health check mode (for Docker)
    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    if args.health {
        match TcpStream::connect(&args.bind).await {
            Ok(_) => {
                println!("OK");
                std::process::exit(0);
            }
            Err(_) => {
                eprintln!("FAILED");
                std::process::exit(1);
            }
        }
    }

    info!("Starting LabSeq Daemon v{}", env!("CARGO_PKG_VERSION"));
    info!("Binding to {}", args.bind);
    info!("Cache capacity: {}", args.capacity);

    // One cache for the whole process, shared by every connection
    let cache = Arc::new(SequenceCache::with_capacity(args.capacity));

    let listener = TcpListener::bind(&args.bind).await?;
    info!("Server listening on {}", args.bind);
    println!("\nLabSeq ready on {} (RESP protocol)", args.bind);
    println!("   redis-cli -p {} LABSEQ 10", port(&args.bind));
    println!("   redis-cli -p {} CACHE STATS", port(&args.bind));
    println!("   redis-cli -p {} CACHE CLEAR\n", port(&args.bind));

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                info!("New connection from {}", addr);
                let cache = Arc::clone(&cache);

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, cache).await {
                        error!("Error handling client {}: {}", addr, e);
                    }
                    info!("Connection closed: {}", addr);
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(mut stream: TcpStream, cache: Arc<SequenceCache>) -> Result<()> {
    let handler = CommandHandler::new(cache);
    let mut buffer = BytesMut::with_capacity(4096);

    loop {
        let n = stream.read_buf(&mut buffer).await?;

        if n == 0 {
            return Ok(());
        }

        loop {
            match RespValue::parse(&mut buffer) {
                Ok(Some(cmd)) => {
                    // Evaluation is CPU-bound; keep it off the I/O workers
                    let response = tokio::task::block_in_place(|| handler.handle(cmd));
                    stream.write_all(&response.serialize()).await?;
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Parse error: {}", e);
                    let error_resp = RespValue::Error(format!("ERR {}", e));
                    stream.write_all(&error_resp.serialize()).await?;
                    buffer.clear();
                    break;
                }
            }
        }
    }
}

fn port(bind: &str) -> &str {
    bind.rsplit(':').next().unwrap_or("6380")
}
