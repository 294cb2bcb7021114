//! Session identity resolution and the authorization gate.

pub mod gate;
pub mod identity;

pub use gate::AuthorizationGate;
pub use identity::{IdentityProvider, IssuedToken, JwtIdentityProvider, Principal};
