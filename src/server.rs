use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, instrument, warn};

use crate::backend::MemoryBackend;
use crate::codec::FrameCodec;
use crate::commands::executable::Executable;
use crate::commands::Command;
use crate::config::Config;
use crate::connection::Connection;
use crate::engine::{Context, StringEngine};
use crate::frame::Frame;
use crate::Error;

pub async fn run(config: Config) -> Result<(), Error> {
    let _ = tracing_subscriber::fmt()
        .try_init()
        .map_err(|e| debug!("Failed to initialize global tracing: {}", e));

    let listener = TcpListener::bind((config.bind.as_str(), config.port)).await?;

    let ctx = Context::new(Arc::new(MemoryBackend::new()))
        .with_namespace(config.namespace.clone())
        .with_max_retries(config.txn_retries);
    let engine = StringEngine::new(ctx);

    info!(
        namespace = engine.namespace(),
        max_retries = config.txn_retries,
        "Server listening on {}",
        listener.local_addr()?
    );

    serve(listener, engine, FrameCodec::new(config.max_frame_size)).await
}

/// Accepts connections on `listener` until accepting fails. Every connection is served on its own
/// task against the same engine.
pub async fn serve(
    listener: TcpListener,
    engine: StringEngine,
    codec: FrameCodec,
) -> Result<(), Error> {
    loop {
        let (socket, client_address) = listener.accept().await?;
        let engine = engine.clone();
        info!("Accepted connection from {:?}", client_address);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(socket, client_address, engine, codec).await {
                error!(e);
            }
        });
    }
}

#[instrument(
    name = "connection",
    skip(stream, engine, codec),
    fields(connection_id, client_address)
)]
async fn handle_connection(
    stream: TcpStream,
    client_address: SocketAddr,
    engine: StringEngine,
    codec: FrameCodec,
) -> Result<(), Error> {
    let mut conn = Connection::new(stream, codec);

    tracing::Span::current()
        .record("connection_id", conn.id.to_string())
        .record("client_address", client_address.to_string());

    while let Some(frame) = conn.read_frame().await? {
        debug!("Received frame from client: {:?}", frame);

        let res = match Command::try_from(frame) {
            Ok(cmd) => cmd.exec(&engine)?,
            Err(err) => {
                warn!("Rejected command: {}", err);
                Frame::from(err)
            }
        };

        debug!("Sending response to client: {:?}", res);
        conn.write_frame(res).await?;
    }

    info!("Connection closed");
    Ok(())
}
