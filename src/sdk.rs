// SDK facade
// Resolves configuration and wires the shared AuthManager into the clients

use std::path::PathBuf;
use std::sync::Arc;

use crate::auth::{AuthManager, AuthSettings};
use crate::cache::{Cache, DiskCache, InMemoryCache};
use crate::clients::IdentityServiceClient;
use crate::config::{CacheKind, CliArgs, ConfigStore, EnvironmentUrls};
use crate::error::{Result, SdkError};

/// Options for [`MdsSdk::initialize`]; explicit values win over the
/// environment file, which wins over URLs discovered from the identity service
#[derive(Clone, Default)]
pub struct SdkOptions {
    /// Environment name; defaults to the selected environment
    pub environment: Option<String>,
    pub urls: EnvironmentUrls,
    pub account: Option<String>,
    pub user_id: Option<String>,
    pub password: Option<String>,

    /// Token to seed the authentication manager with
    pub token: Option<String>,

    pub cache: CacheKind,

    /// Cache file for [`CacheKind::Disk`]; defaults to `{settings_dir}/cache`
    pub cache_file: Option<PathBuf>,

    /// Settings directory; defaults to [`crate::config::default_settings_dir`]
    pub settings_dir: Option<PathBuf>,
}

impl From<CliArgs> for SdkOptions {
    fn from(args: CliArgs) -> Self {
        Self {
            environment: args.environment,
            urls: EnvironmentUrls {
                identity_url: args.identity_url,
                allow_self_sign_cert: args.allow_self_sign_cert,
                ..Default::default()
            },
            account: args.account,
            user_id: args.user_id,
            password: args.password,
            token: args.token,
            cache: args.cache,
            cache_file: args.cache_file.map(|p| crate::config::expand_tilde(&p)),
            settings_dir: args.settings_dir.map(|p| crate::config::expand_tilde(&p)),
        }
    }
}

/// Entry point to the MdsCloud services
///
/// Each instance owns its own [`AuthManager`]; re-initializing means
/// building a new `MdsSdk`.
pub struct MdsSdk {
    environment: String,
    urls: EnvironmentUrls,
    auth_manager: Arc<AuthManager>,
}

impl MdsSdk {
    /// Resolve configuration and build the shared authentication manager
    pub async fn initialize(options: SdkOptions) -> Result<Self> {
        let store = match &options.settings_dir {
            Some(dir) => ConfigStore::new(dir),
            None => ConfigStore::from_env(),
        };

        let environment = options
            .environment
            .clone()
            .unwrap_or_else(|| store.default_env());
        let file_config = store.env_config(&environment).unwrap_or_default();
        tracing::debug!(environment = %environment, config = ?file_config, "Loaded environment configuration");

        let configured = options.urls.clone().or(file_config.urls);
        let allow_self_sign_cert = configured.allow_self_sign_cert.unwrap_or(false);

        let discovered = match &configured.identity_url {
            Some(identity_url) => {
                IdentityServiceClient::new(identity_url.clone(), None, allow_self_sign_cert)?
                    .configuration_urls()
                    .await
            }
            None => EnvironmentUrls::default(),
        };

        // The certificate policy is settled before discovery; a discovered flag is ignored
        let mut urls = configured.or(discovered);
        urls.allow_self_sign_cert = Some(allow_self_sign_cert);

        let identity_url = urls
            .identity_url
            .clone()
            .ok_or_else(|| SdkError::Config("identity url is not configured".to_string()))?;

        let settings = AuthSettings {
            identity_url,
            account: options.account.or(file_config.account).unwrap_or_default(),
            user_id: options.user_id.or(file_config.user_id).unwrap_or_default(),
            password: options.password.or(file_config.password).unwrap_or_default(),
            allow_self_sign_cert,
        };

        let cache: Arc<dyn Cache> = match options.cache {
            CacheKind::Memory => Arc::new(InMemoryCache::new()),
            CacheKind::Disk => Arc::new(match options.cache_file {
                Some(path) => DiskCache::new(path),
                None => DiskCache::in_dir(store.settings_dir()),
            }),
        };

        let auth_manager = Arc::new(AuthManager::new(settings, cache)?);
        if let Some(token) = &options.token {
            auth_manager.set_authentication_token(token).await?;
        }

        tracing::info!(
            environment = %environment,
            identity_url = %auth_manager.identity_url(),
            "SDK initialized"
        );

        Ok(Self {
            environment,
            urls,
            auth_manager,
        })
    }

    /// Get the resolved environment name
    pub fn environment(&self) -> &str {
        &self.environment
    }

    /// Get the resolved service URLs; `allow_self_sign_cert` is always set
    /// and matches the authentication manager
    pub fn service_urls(&self) -> &EnvironmentUrls {
        &self.urls
    }

    /// Get the shared authentication manager
    pub fn auth_manager(&self) -> Arc<AuthManager> {
        Arc::clone(&self.auth_manager)
    }

    /// Create an identity service client sharing this SDK's tokens
    pub fn identity_client(&self) -> Result<IdentityServiceClient> {
        IdentityServiceClient::new(
            self.auth_manager.identity_url(),
            Some(self.auth_manager()),
            self.auth_manager.allow_self_sign_cert(),
        )
    }
}
