//! A generic endpoint process: registers with a broker and serves
//! requests from a minimal built-in [`DataStore`] that holds no real
//! data (spec §1 puts the actual backend — search, ranking,
//! persistence — out of scope for the core). It exists so the broker
//! side of the protocol (registration, routing, dispatch) can be
//! exercised end-to-end without depending on the illustrative
//! random-data demo in `demos/random-library`.

use std::net::SocketAddr;

use anyhow::Context;
use async_trait::async_trait;
use clap::Parser;
use librarian::endpoint::{DataStore, Endpoint};
use librarian::protocol::{ConnectRequest, LookupResponse, SearchRequest, SearchResponse, TransformRequest};
use librarian::transport::tcp::TcpLink;
use librarian::types::{AccessIdentifier, DynamicTransformId, ResourceType};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// `endpoint [myHost myPort [libHost libPort]]` — defaults to
/// `localhost:8082` and `localhost:8081` (spec §6).
#[derive(Parser, Debug)]
struct Args {
	#[arg(default_value = "localhost")]
	my_host: String,
	#[arg(default_value_t = 8082)]
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

	let connect_request = ConnectRequest::new(my_addr.ip().to_string(), my_addr.port(), ResourceType::ALL.into_iter().collect());

	info!(%my_addr, lib_host = %args.lib_host, lib_port = args.lib_port, "endpoint connecting");
	let endpoint = Endpoint::new(EmptyDataStore);
	endpoint.run(link, connect_request).await;

	if endpoint.assigned_key().is_none() {
		error!("broker refused our connect request");
	}
	Ok(())
}

/// Answers every request with an empty, error-free result set: it
/// "supports" all eight resource types but holds no data, so there is
/// never anything to find (spec §4.5's non-support contract: empty
/// `results`, no `error`, because the type itself is supported).
struct EmptyDataStore;

#[async_trait]
impl DataStore for EmptyDataStore {
	async fn run_search(&self, _req: &SearchRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_container_transform(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_contents_transform(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_overlaps(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_occur_as_obj(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_occur_as_subj(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_occur_has_obj(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_occur_has_subj(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_nearby_locations(&self, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn run_dynamic(&self, _dt_id: &DynamicTransformId, _req: &TransformRequest) -> SearchResponse {
		SearchResponse::empty()
	}

	async fn lookup(&self, kind: ResourceType, id: &AccessIdentifier) -> LookupResponse {
		LookupResponse::stub(AccessIdentifier::error_stub(id.identifier.clone(), id.resource_id.clone(), format!("no {kind} held by this endpoint")))
	}
}
