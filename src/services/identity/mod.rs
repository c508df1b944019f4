pub mod factory;
pub mod firebase;
pub mod shared_secret;
pub mod verifier;

pub use factory::build_identity_verifier;
pub use verifier::{Identity, IdentityVerifier};
