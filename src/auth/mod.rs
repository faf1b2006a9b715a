//! Authentication - the auth collaborator and the client's session state.

/// Password sign-in, sign-up and session tokens
pub mod provider;
/// Observable session lifecycle
pub mod session;

pub use provider::{AuthProvider, AuthSession, LocalAuthProvider, Profile};
pub use session::{SessionState, SessionStore};
