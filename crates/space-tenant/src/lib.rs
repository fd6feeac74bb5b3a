//! Tenant resolution and tenant configuration loading.
//!
//! [`resolve`] maps a request to a [`TenantId`] without touching the network;
//! [`TenantConfigLoader`] fetches the tenant's record and normalizes it into a
//! [`TenantConfig`].

pub mod config;
pub mod error;
pub mod loader;
pub mod resolver;
pub mod themes;

pub use config::{
    AssetsConfig, BrandConfig, CommunityConfig, LogoSet, NavItem, NavigationConfig,
    PageDefinition, TenantConfig, UiConfig,
};
pub use error::TenantConfigError;
pub use loader::{MemTenantRecords, TenantConfigLoader, TenantRecordStore, normalize_record};
pub use resolver::{
    DEFAULT_FALLBACK_TENANT, PRODUCTION_TENANT, ResolveContext, Resolution, ResolverConfig,
    resolve, resolve_detailed, resolve_domain,
};
pub use space_types::TenantId;
pub use themes::ThemeLibrary;
