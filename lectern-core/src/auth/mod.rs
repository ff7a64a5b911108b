//! Credentials: password hashing and bearer token issuance/verification.
//!
//! Both halves are deliberately free of storage concerns; the
//! [`AuthService`](crate::domain::auth::AuthService) wires them to the users
//! repository.

pub mod crypto;
pub mod tokens;

pub use crypto::{PasswordCrypto, PasswordCryptoError};
pub use tokens::{Claims, TokenKind, TokenPair, TokenService, TokenSettings};
