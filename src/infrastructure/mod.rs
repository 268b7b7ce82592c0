pub mod cancellation;
pub mod connection_id;

pub use cancellation::CancellationGate;
pub use connection_id::ConnectionId;
