//! # quikchat-auth
//!
//! Verifies the bearer tokens clients present when opening a real-time
//! connection or calling the event endpoints. Tokens are minted by the
//! account service; this crate only needs the shared HMAC secret.
//!
//! ## Modules
//!
//! - `jwt`: claims, decoding with validation, and encoding (tests, tooling)
//! - `authenticator`: the [`Authenticator`](quikchat_core::traits::Authenticator)
//!   implementation used by the API layer

pub mod authenticator;
pub mod jwt;

pub use authenticator::JwtAuthenticator;
pub use jwt::{Claims, JwtDecoder, JwtEncoder};
