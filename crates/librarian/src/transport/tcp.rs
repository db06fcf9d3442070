//! Real transport for the `librarian`/`endpoint` binaries: newline
//! delimited JSON over a TCP socket, one message per line, using
//! [`crate::protocol::wire`]'s envelopes to correlate replies.

use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use parking_lot::Mutex;
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::{mpsc, oneshot};
use tokio_util::codec::{FramedRead, FramedWrite, LinesCodec};
use tracing::warn;

use super::{EndpointHandle, TransportError};
use crate::protocol::wire::{BrokerIncoming, BrokerToClient, BrokerToEndpoint, ClientToBroker, Envelope, EndpointToBroker};
use crate::protocol::{ConnectRequest, LibraryConnected, Request, Response};

/// Broker-side handle wrapping one accepted TCP connection. Spawns a
/// reader task that demultiplexes incoming `Response` envelopes onto
/// whichever `send` call is waiting for that correlation id, and a
/// writer task that serializes outgoing lines onto the socket in
/// order.
pub struct TcpEndpointHandle {
	pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>>,
	next_id: AtomicU64,
	writer: mpsc::UnboundedSender<String>,
	closed: Arc<tokio::sync::Notify>,
}

impl TcpEndpointHandle {
	/// Take ownership of an accepted connection and start its reader and
	/// writer tasks. The caller has already consumed the initial
	/// `Connect` line off `stream` before handing it here.
	pub fn spawn(stream: TcpStream) -> Self {
		let (read_half, write_half) = stream.into_split();
		spawn_link(FramedRead::new(read_half, LinesCodec::new()), FramedWrite::new(write_half, LinesCodec::new()))
	}
}

/// A just-accepted TCP connection before the broker has decided
/// whether to admit it. Reads the one `Connect` line and writes the
/// one `LibraryConnected` reply manually, then — only on acceptance —
/// hands the same framed halves off to a [`TcpEndpointHandle`], so the
/// handshake and the steady-state request/response traffic share one
/// socket without re-splitting it.
pub struct PendingConnection {
	read: FramedRead<OwnedReadHalf, LinesCodec>,
	write: FramedWrite<OwnedWriteHalf, LinesCodec>,
}

impl PendingConnection {
	pub fn new(stream: TcpStream) -> Self {
		let (read_half, write_half) = stream.into_split();
		Self { read: FramedRead::new(read_half, LinesCodec::new()), write: FramedWrite::new(write_half, LinesCodec::new()) }
	}

	/// Read the very first line of a freshly accepted connection and
	/// decide whether it came from an endpoint registering or a client
	/// issuing its first request (spec §6: both reach the broker through
	/// the same `library-service` address). `Ok(None)` if the connection
	/// closed before sending anything.
	pub async fn recv_first(&mut self) -> io::Result<Option<BrokerIncoming>> {
		match self.read.next().await {
			None => Ok(None),
			Some(Ok(line)) => serde_json::from_str(&line).map(Some).map_err(io::Error::other),
			Some(Err(err)) => Err(io::Error::other(err)),
		}
	}

	pub async fn send_ack(&mut self, ack: LibraryConnected) -> io::Result<()> {
		let line = serde_json::to_string(&BrokerToEndpoint::LibraryConnected(ack))?;
		self.write.send(line).await.map_err(io::Error::other)
	}

	/// Accepted: start serving this connection as a normal endpoint
	/// handle.
	pub fn into_handle(self) -> TcpEndpointHandle {
		spawn_link(self.read, self.write)
	}

	/// Send one reply to a client request.
	pub async fn send_client_response(&mut self, envelope: Envelope<Response>) -> io::Result<()> {
		let line = serde_json::to_string(&BrokerToClient::Response(envelope))?;
		self.write.send(line).await.map_err(io::Error::other)
	}

	/// Read the next request in an already-started client session.
	/// `Ok(None)` once the client closes the connection.
	pub async fn recv_client_request(&mut self) -> io::Result<Option<Envelope<Request>>> {
		match self.read.next().await {
			None => Ok(None),
			Some(Ok(line)) => match serde_json::from_str::<BrokerIncoming>(&line)? {
				BrokerIncoming::Request(envelope) => Ok(Some(envelope)),
				BrokerIncoming::Connect(_) => Err(io::Error::other("unexpected Connect after a client session started")),
			},
			Some(Err(err)) => Err(io::Error::other(err)),
		}
	}
}

fn spawn_link(mut framed_read: FramedRead<OwnedReadHalf, LinesCodec>, mut framed_write: FramedWrite<OwnedWriteHalf, LinesCodec>) -> TcpEndpointHandle {
	let pending: Arc<Mutex<HashMap<u64, oneshot::Sender<Response>>>> = Arc::new(Mutex::new(HashMap::new()));
	let pending_for_reader = pending.clone();
	let closed = Arc::new(tokio::sync::Notify::new());
	let closed_for_reader = closed.clone();

	let (writer_tx, mut writer_rx) = mpsc::unbounded_channel::<String>();
	tokio::spawn(async move {
		while let Some(line) = writer_rx.recv().await {
			if framed_write.send(line).await.is_err() {
				break;
			}
		}
	});

	tokio::spawn(async move {
		while let Some(line) = framed_read.next().await {
			let line = match line {
				Ok(line) => line,
				Err(err) => {
					warn!(target: "transport", %err, "broker connection read error");
					break;
				},
			};
			let msg = match serde_json::from_str::<EndpointToBroker>(&line) {
				Ok(msg) => msg,
				Err(err) => {
					warn!(target: "transport", %err, "dropping malformed endpoint message");
					continue;
				},
			};
			if let EndpointToBroker::Response(env) = msg
				&& let Some(tx) = pending_for_reader.lock().remove(&env.id)
			{
				let _ = tx.send(env.payload);
			}
		}
		closed_for_reader.notify_one();
	});

	TcpEndpointHandle { pending, next_id: AtomicU64::new(0), writer: writer_tx, closed }
}

impl TcpEndpointHandle {
	/// Send a `LibraryConnected` ack over this handle's outbound line,
	/// bypassing the request/response correlation table (an ack isn't a
	/// reply to any particular `send` call).
	pub fn send_ack(&self, ack: LibraryConnected) -> Result<(), TransportError> {
		let line = serde_json::to_string(&BrokerToEndpoint::LibraryConnected(ack)).map_err(|_| TransportError::Closed)?;
		self.writer.send(line).map_err(|_| TransportError::Closed)
	}

	/// Resolve once the underlying socket's read half has closed, so the
	/// broker can notice a dropped endpoint and deregister it (the
	/// disconnection path `SPEC_FULL.md` §4.2 adds on top of the
	/// distilled spec).
	pub async fn closed(&self) {
		self.closed.notified().await;
	}
}

#[async_trait]
impl EndpointHandle for TcpEndpointHandle {
	async fn send(&self, request: Request) -> Result<Response, TransportError> {
		let id = self.next_id.fetch_add(1, Ordering::Relaxed);
		let (reply_tx, reply_rx) = oneshot::channel();
		self.pending.lock().insert(id, reply_tx);

		let envelope = BrokerToEndpoint::Request(Envelope::new(id, request));
		let line = serde_json::to_string(&envelope).map_err(|_| TransportError::Closed)?;
		if self.writer.send(line).is_err() {
			self.pending.lock().remove(&id);
			return Err(TransportError::Closed);
		}

		reply_rx.await.map_err(|_| TransportError::Closed)
	}
}

/// Endpoint-side connection to the broker: a thin, message-at-a-time
/// wrapper over the same line protocol, used by the `endpoint` binary
/// to send its `Connect` and then serve `Request`s as they arrive.
pub struct TcpLink {
	read: FramedRead<OwnedReadHalf, LinesCodec>,
	write: FramedWrite<OwnedWriteHalf, LinesCodec>,
}

impl TcpLink {
	pub async fn connect(hostname: &str, port: u16) -> io::Result<Self> {
		let stream = TcpStream::connect((hostname, port)).await?;
		let (read_half, write_half) = stream.into_split();
		Ok(Self { read: FramedRead::new(read_half, LinesCodec::new()), write: FramedWrite::new(write_half, LinesCodec::new()) })
	}

	pub async fn send_to_broker(&mut self, msg: &EndpointToBroker) -> io::Result<()> {
		let line = serde_json::to_string(msg)?;
		self.write.send(line).await.map_err(io::Error::other)
	}

	pub async fn recv_from_broker(&mut self) -> io::Result<Option<BrokerToEndpoint>> {
		match self.read.next().await {
			None => Ok(None),
			Some(Ok(line)) => serde_json::from_str(&line).map(Some).map_err(io::Error::other),
			Some(Err(err)) => Err(io::Error::other(err)),
		}
	}
}

/// A client's connection to the broker over the same line protocol.
/// No handshake: the first line sent on this socket is already a
/// `Request` (spec §6 — clients reach `library-service` directly).
/// Not part of the core broker/endpoint contract (spec §1 calls
/// example client helpers non-core); kept here because both ends of
/// the wire live next to each other and a real client needs something
/// to drive a request/response round trip against.
pub struct TcpClient {
	read: FramedRead<OwnedReadHalf, LinesCodec>,
	write: FramedWrite<OwnedWriteHalf, LinesCodec>,
	next_id: u64,
}

impl TcpClient {
	pub async fn connect(hostname: &str, port: u16) -> io::Result<Self> {
		let stream = TcpStream::connect((hostname, port)).await?;
		let (read_half, write_half) = stream.into_split();
		Ok(Self { read: FramedRead::new(read_half, LinesCodec::new()), write: FramedWrite::new(write_half, LinesCodec::new()), next_id: 0 })
	}

	/// Send `request` and await the matching reply. Requests on one
	/// `TcpClient` are answered strictly in order, so no correlation-id
	/// bookkeeping is needed on this side even though the wire carries
	/// one (a future pipelining client could reorder replies against
	/// concurrently in-flight ids).
	pub async fn call(&mut self, request: Request) -> io::Result<Response> {
		let id = self.next_id;
		self.next_id += 1;

		let envelope = Envelope::new(id, request);
		let line = serde_json::to_string(&ClientToBroker::Request(envelope))?;
		self.write.send(line).await.map_err(io::Error::other)?;

		match self.read.next().await {
			None => Err(io::Error::other("broker closed the connection before replying")),
			Some(Ok(line)) => {
				let BrokerToClient::Response(envelope) = serde_json::from_str(&line)?;
				if envelope.id != id {
					return Err(io::Error::other("broker replied out of order"));
				}
				Ok(envelope.payload)
			},
			Some(Err(err)) => Err(io::Error::other(err)),
		}
	}
}
