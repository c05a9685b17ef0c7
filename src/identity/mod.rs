//! Hosted identity service abstraction and client.

mod hosted;
mod provider;

pub use hosted::HostedIdentity;
pub use provider::{
    AuthUser, IdentityProvider, OtpType, Session, SignInOutcome, SignUpMethod, SignUpOutcome,
    SignUpRequest,
};
