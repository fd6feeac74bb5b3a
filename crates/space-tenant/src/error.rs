use space_types::TenantId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TenantConfigError {
    #[error("no active config for tenant '{0}'")]
    ConfigNotFound(TenantId),
    #[error("config for tenant '{tenant}' is invalid: {reason}")]
    ConfigInvalid { tenant: TenantId, reason: String },
    #[error("tenant record store failed for '{tenant}': {source}")]
    Store {
        tenant: TenantId,
        #[source]
        source: anyhow::Error,
    },
}
