//! Client-visible event protocol: event types, wire framing and the
//! per-turn delivery channel.

pub mod encoder;
pub mod event;
pub mod transport;

pub use encoder::{decode_frame, encode_frame, events_for, AgentTransition};
pub use event::StreamEvent;
pub use transport::{StreamTransport, TurnStream};
