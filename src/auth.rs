//! Auth-domain identifiers, PKCE material, and redacted secrets.

pub mod id;
pub mod pkce;
pub mod secret;

pub use id::*;
pub use pkce::*;
pub use secret::*;
