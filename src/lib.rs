// MdsCloud SDK - Library root

pub mod auth;
pub mod cache;
pub mod clients;
pub mod config;
pub mod error;
pub mod http_client;
pub mod sdk;
pub mod utils;

pub use auth::{AuthError, AuthManager, AuthSettings, CredentialOverrides};
pub use cache::{Cache, CacheExt, DiskCache, InMemoryCache};
pub use error::SdkError;
pub use sdk::{MdsSdk, SdkOptions};
