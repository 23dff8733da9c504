use std::sync::Arc;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    ArmyService, AuthService, SeaOrmArmyService, SeaOrmAuthService, TokenService,
};

/// Process-wide state built once at startup. The configuration, including the
/// signing secret and registration code, is immutable after this point.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub tokens: Arc<TokenService>,

    pub auth_service: Arc<dyn AuthService>,

    pub army_service: Arc<dyn ArmyService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        config.validate()?;

        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        Self::with_store(config, store)
    }

    pub fn with_store(config: Config, store: Store) -> anyhow::Result<Self> {
        let secret = config
            .auth
            .jwt_secret
            .clone()
            .ok_or_else(|| anyhow::anyhow!("JWT secret is not configured"))?;
        let tokens = Arc::new(TokenService::new(&secret, config.auth.token_ttl()?));

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens.clone(),
            config.auth.clone(),
        )) as Arc<dyn AuthService + Send + Sync + 'static>;

        let army_service = Arc::new(SeaOrmArmyService::new(
            store.clone(),
            config.armies.enforce_point_totals,
        )) as Arc<dyn ArmyService + Send + Sync + 'static>;

        Ok(Self {
            config: Arc::new(config),
            store,
            tokens,
            auth_service,
            army_service,
        })
    }
}
