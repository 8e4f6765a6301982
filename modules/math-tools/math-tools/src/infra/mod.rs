pub mod remote;

pub use remote::{HttpRemoteClient, RemoteClient, RemoteEnvelope, TransportError};
