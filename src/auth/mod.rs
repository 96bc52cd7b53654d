// Authentication module
// Manages identity token lifecycle shared by every service client

mod authenticate;
mod error;
mod manager;
mod token;
mod types;

pub use authenticate::authenticate_url;
pub use error::AuthError;
pub use manager::{cache_key, AuthManager};
pub use token::{decode_claims, EXPIRY_BUFFER_SECS};
pub use types::{AuthSettings, CredentialOverrides, IdentityClaims};
