//! Signed, store-backed sessions.
//!
//! Three pieces compose the session subsystem:
//!
//! - [`SessionStore`]: the narrow persistence contract (`get`/`set`/
//!   `delete`), with [`MemoryStore`] as the injectable default.
//! - [`cookie`]: the signed-identifier transport. Clients hold
//!   `<id>.<hmac>`; the server never trusts an identifier whose signature
//!   does not verify.
//! - [`SessionLayer`]/[`SessionService`]: middleware wiring a [`Session`]
//!   handle into every request and persisting it afterwards.
//!
//! Sessions and access tokens are orthogonal: a request may carry a valid
//! session and no token, or a valid token and no session. The gateway
//! composes both on the same request without either consulting the other.

pub mod cookie;
pub mod middleware;
pub mod store;

// Re-exports
pub use middleware::{Session, SessionLayer, SessionService};
pub use store::{MemoryStore, SessionRecord, SessionStore, StoreError};
