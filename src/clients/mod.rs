// Service clients

pub mod identity;

pub use identity::IdentityServiceClient;
