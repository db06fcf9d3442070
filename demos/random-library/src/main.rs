//! The illustrative random-data demo endpoint (spec §1): connects to a
//! broker and serves every request from [`data_store::RandomDataStore`].
//! Not part of the core broker/endpoint contract — a stand-in for a
//! real backend so the system can be exercised end-to-end.

mod data_store;

use std::net::SocketAddr;

use anyhow::Context;
use clap::Parser;
use data_store::RandomDataStore;
use librarian::endpoint::Endpoint;
use librarian::protocol::ConnectRequest;
use librarian::transport::tcp::TcpLink;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// `random-library [myHost myPort [libHost libPort]]` — mirrors the
/// core `endpoint` CLI's argument shape (spec §6) with its own
/// defaults so it can run alongside a real `endpoint` process without
/// a port clash.
#[derive(Parser, Debug)]
struct Args {
	#[arg(default_value = "localhost")]
	my_host: String,
	#[arg(default_value_t = 8090)]
	my_port: u16,
	#[arg(default_value = "localhost")]
	lib_host: String,
	#[arg(default_value_t = 8081)]
	lib_port: u16,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into())).init();

	let args = Args::parse();
	let my_addr: SocketAddr = format!("{}:{}", args.my_host, args.my_port).parse().context("invalid local hostname/port")?;

	let link = TcpLink::connect(&args.lib_host, args.lib_port).await.with_context(|| format!("connecting to librarian at {}:{}", args.lib_host, args.lib_port))?;

	let data_store = RandomDataStore::new();
	let connect_request = ConnectRequest::new(my_addr.ip().to_string(), my_addr.port(), data_store.supported_types()).with_dynamic_transforms(data_store.dynamic_transforms());

	info!(%my_addr, lib_host = %args.lib_host, lib_port = args.lib_port, "random-library demo endpoint connecting");
	let endpoint = Endpoint::new(data_store);
	endpoint.run(link, connect_request).await;

	if endpoint.assigned_key().is_none() {
		error!("broker refused our connect request");
	}
	Ok(())
}
