use thiserror::Error;

/// Errors the registry can report. Neither is ever sent over the wire
/// as a transport exception (spec §7) — `KeyCollision`'s `Display`
/// string is what `Registry::connect` puts in a refused
/// `LibraryConnected`'s `error` field, and `UnknownResource` backs the
/// typed lookup/transform stubs the Router and Dispatcher build.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
	#[error("requested key '{key}' is already held by a different (host, port, group)")]
	KeyCollision { key: String },

	#[error("no endpoint registered under resource id '{0}'")]
	UnknownResource(String),
}
