//! Server-side enrichment of capture-agent events
//!
//! Everything here is best-effort: a record is still created when the
//! user-agent is unrecognized, the client address is missing, or the
//! country lookup fails.

pub mod geo;
pub mod ip;
pub mod ua;

pub use geo::CountryResolver;
pub use ip::{client_ip, is_private_ip};
pub use ua::{parse_user_agent, ParsedAgent};
