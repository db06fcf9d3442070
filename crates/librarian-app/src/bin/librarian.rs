//! The broker process: accepts endpoint connections, registers them,
//! and serves client requests over the same newline-delimited JSON
//! protocol (spec §6). Both kinds of peer reach the broker through the
//! same `library-service` address; the first line on a freshly
//! accepted connection says which one it is (spec §6,
//! `BrokerIncoming`).

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use librarian::protocol::wire::BrokerIncoming;
use librarian::transport::tcp::PendingConnection;
use librarian::{Dispatcher, Registry};
use tokio::net::{TcpListener, TcpStream};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// `librarian [hostname port]` — defaults to `localhost:8081` (spec §6).
#[derive(Parser, Debug)]
struct Args {
	#[arg(default_value = "localhost")]
	hostname: String,
	#[arg(default_value_t = 8081)]
	port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())).init();

	let args = Args::parse();
	let addr: SocketAddr = format!("{}:{}", args.hostname, args.port).parse().context("invalid hostname/port")?;

	let registry = Arc::new(Registry::new());
	let dispatcher = Arc::new(Dispatcher::new(registry.clone()));

	let listener = TcpListener::bind(addr).await.with_context(|| format!("binding {addr}"))?;
	info!(%addr, "librarian listening");

	loop {
		let (stream, peer) = listener.accept().await?;
		let registry = registry.clone();
		let dispatcher = dispatcher.clone();
		tokio::spawn(async move {
			if let Err(err) = serve_connection(stream, &registry, &dispatcher).await {
				warn!(%peer, %err, "connection ended with error");
			}
		});
	}
}

async fn serve_connection(stream: TcpStream, registry: &Registry, dispatcher: &Dispatcher) -> anyhow::Result<()> {
	let mut pending = PendingConnection::new(stream);
	match pending.recv_first().await? {
		None => Ok(()),
		Some(BrokerIncoming::Connect(connect_req)) => serve_endpoint(pending, connect_req, registry).await,
		Some(BrokerIncoming::Request(envelope)) => serve_client(pending, envelope, dispatcher).await,
	}
}

/// Admit a connecting endpoint and keep its handle alive in the
/// registry until the socket closes, at which point we deregister it
/// (spec §9's open "no deregistration" question, resolved as described
/// in `DESIGN.md`).
async fn serve_endpoint(pending: PendingConnection, connect_req: librarian::protocol::ConnectRequest, registry: &Registry) -> anyhow::Result<()> {
	let hostname = connect_req.hostname.clone();
	let port = connect_req.port;

	let handle = Arc::new(pending.into_handle());
	let ack = registry.connect(connect_req, handle.clone());
	handle.send_ack(ack.clone())?;

	if !ack.is_accepted() {
		warn!(%hostname, port, error = ?ack.error, "endpoint connect refused");
		return Ok(());
	}

	info!(key = %ack.key, group_id = %ack.group_id, %hostname, port, "endpoint connected");
	handle.closed().await;
	registry.disconnect(&ack.key);
	info!(key = %ack.key, "endpoint disconnected");
	Ok(())
}

/// Serve a client session: dispatch its first request, then keep
/// reading further requests off the same connection until it closes
/// (spec §2: "client opens a session... a request of any kind is one
/// round trip").
async fn serve_client(mut pending: PendingConnection, first: librarian::protocol::wire::Envelope<librarian::Request>, dispatcher: &Dispatcher) -> anyhow::Result<()> {
	let mut next = Some(first);
	while let Some(envelope) = next {
		let response = dispatcher.dispatch(envelope.payload).await;
		pending.send_client_response(librarian::protocol::wire::Envelope::new(envelope.id, response)).await?;
		next = pending.recv_client_request().await?;
	}
	Ok(())
}
