//! mcmon-proto — memcached text-protocol client.
//!
//! Talks the plain-text memcached admin protocol: issue a line command,
//! read the multi-line response up to the `END` terminator, parse the
//! lines that matter.
//!
//! # Architecture
//!
//! ```text
//! Instance (one per host:port, one per polling cycle)
//!   ├── command() → read-until-END response text
//!   ├── stats() → RawStats (STAT lines)
//!   ├── slab_ids() → slab ids (STAT items:<id>:number lines)
//!   └── key_details() / keys() → cachedump ITEM lines across slabs
//! ```
//!
//! The protocol is a streaming line protocol with no length framing, so
//! the client reads until it sees the literal `END` token and tolerates
//! partial reads along the way. Connection state is explicit and owned
//! by the `Instance`: opened lazily on the first command, closed by the
//! caller, never shared or reused across cycles.

pub mod error;
pub mod instance;
pub mod parse;
pub mod types;

pub use error::{ProtoError, ProtoResult};
pub use instance::Instance;
pub use types::{KeyDetail, RawStats, StatValue};
