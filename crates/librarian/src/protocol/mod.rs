//! The request/response contract (spec §3, §6): one `Search`, nine
//! transforms, eight typed lookups, and the connect handshake. This is
//! the "structured message format" the spec assumes exists; see
//! [`wire`] for how we actually frame it on a socket.

mod connect;
mod record;
mod request;
mod response;
pub mod wire;

pub use connect::{ConnectRequest, LibraryConnected};
pub use record::ResourceRecord;
pub use request::{LookupRequest, Params, Request, SearchRequest, TransformKind, TransformRequest};
pub use response::{LookupResponse, Response, SearchResponse, SearchResult};
