//! Request → tenant id.
//!
//! Priority, first match wins: explicit id, developer override (dev only),
//! domain-derived id, static fallback. Everything here is a function of its
//! inputs; nothing reads the network, storage or the clock.

use space_types::TenantId;
use std::collections::BTreeMap;

/// Tenant that production aliases and preview deployments map to.
pub const PRODUCTION_TENANT: &str = "nouns";

/// Tenant used when nothing else matches.
pub const DEFAULT_FALLBACK_TENANT: &str = "nouns";

/// Environment variables read by [`ResolverConfig::from_env`].
pub const DEV_TENANT_ENV: &str = "SPACE_DEV_TENANT";
pub const FALLBACK_TENANT_ENV: &str = "SPACE_FALLBACK_TENANT";

const LOCALHOST: &str = "localhost";

/// Inputs available on an inbound request.
#[derive(Debug, Clone, Default)]
pub struct ResolveContext {
    pub explicit_id: Option<String>,
    pub domain: Option<String>,
    pub is_dev: bool,
}

impl ResolveContext {
    pub fn for_domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Consulted only when the request is a development request.
    pub dev_override: Option<TenantId>,
    /// Exact domain matches for staging and alias hosts.
    pub domain_overrides: BTreeMap<String, TenantId>,
    /// Host suffixes of ephemeral preview deployments.
    pub preview_suffixes: Vec<String>,
    /// A preview host must also contain one of these to count as ours.
    pub product_markers: Vec<String>,
    pub production_tenant: TenantId,
    pub fallback: Option<TenantId>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        let mut domain_overrides = BTreeMap::new();
        domain_overrides.insert(
            "staging.nounspace.com".to_string(),
            TenantId::from(PRODUCTION_TENANT),
        );
        Self {
            dev_override: None,
            domain_overrides,
            preview_suffixes: vec![".vercel.app".to_string()],
            product_markers: vec!["nounspace".to_string()],
            production_tenant: TenantId::from(PRODUCTION_TENANT),
            fallback: Some(TenantId::from(DEFAULT_FALLBACK_TENANT)),
        }
    }
}

impl ResolverConfig {
    /// Defaults with the dev override and fallback taken from the environment.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(dev) = non_empty_env(DEV_TENANT_ENV) {
            config.dev_override = Some(TenantId::from(dev));
        }
        if let Some(fallback) = non_empty_env(FALLBACK_TENANT_ENV) {
            config.fallback = Some(TenantId::from(fallback));
        }
        config
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Which rule produced a tenant id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Explicit(TenantId),
    DevOverride(TenantId),
    DomainOverride(TenantId),
    PreviewDeployment(TenantId),
    Localhost(TenantId),
    Subdomain(TenantId),
    /// Two-label host: the first label is used, so `foo.com` and `foo.org`
    /// land on the same tenant.
    ApexDomain(TenantId),
    Fallback(TenantId),
}

impl Resolution {
    pub fn tenant(&self) -> &TenantId {
        match self {
            Resolution::Explicit(id)
            | Resolution::DevOverride(id)
            | Resolution::DomainOverride(id)
            | Resolution::PreviewDeployment(id)
            | Resolution::Localhost(id)
            | Resolution::Subdomain(id)
            | Resolution::ApexDomain(id)
            | Resolution::Fallback(id) => id,
        }
    }

    pub fn into_tenant(self) -> TenantId {
        match self {
            Resolution::Explicit(id)
            | Resolution::DevOverride(id)
            | Resolution::DomainOverride(id)
            | Resolution::PreviewDeployment(id)
            | Resolution::Localhost(id)
            | Resolution::Subdomain(id)
            | Resolution::ApexDomain(id)
            | Resolution::Fallback(id) => id,
        }
    }

    pub fn rule(&self) -> &'static str {
        match self {
            Resolution::Explicit(_) => "explicit",
            Resolution::DevOverride(_) => "dev_override",
            Resolution::DomainOverride(_) => "domain_override",
            Resolution::PreviewDeployment(_) => "preview_deployment",
            Resolution::Localhost(_) => "localhost",
            Resolution::Subdomain(_) => "subdomain",
            Resolution::ApexDomain(_) => "apex_domain",
            Resolution::Fallback(_) => "fallback",
        }
    }
}

/// Resolve a tenant id. `None` only when every rule fails and no fallback is
/// configured.
pub fn resolve(context: &ResolveContext, config: &ResolverConfig) -> Option<TenantId> {
    resolve_detailed(context, config).map(Resolution::into_tenant)
}

pub fn resolve_detailed(context: &ResolveContext, config: &ResolverConfig) -> Option<Resolution> {
    if let Some(explicit) = context.explicit_id.as_deref().map(str::trim) {
        if !explicit.is_empty() {
            return Some(Resolution::Explicit(TenantId::from(explicit)));
        }
    }
    if context.is_dev {
        if let Some(dev) = &config.dev_override {
            return Some(Resolution::DevOverride(dev.clone()));
        }
    }
    if let Some(found) = context
        .domain
        .as_deref()
        .and_then(|domain| resolve_domain(domain, config))
    {
        return Some(found);
    }
    config.fallback.clone().map(Resolution::Fallback)
}

/// Domain rules alone, without the fallback.
pub fn resolve_domain(domain: &str, config: &ResolverConfig) -> Option<Resolution> {
    let host = normalize_host(domain)?;

    if let Some(id) = config.domain_overrides.get(&host) {
        return Some(Resolution::DomainOverride(id.clone()));
    }

    let is_preview = config
        .preview_suffixes
        .iter()
        .any(|suffix| host.ends_with(suffix.as_str()));
    if is_preview
        && config
            .product_markers
            .iter()
            .any(|marker| host.contains(marker.as_str()))
    {
        return Some(Resolution::PreviewDeployment(
            config.production_tenant.clone(),
        ));
    }

    let labels: Vec<&str> = host.split('.').collect();

    if host.contains(LOCALHOST) {
        if let Some(pos) = labels.iter().position(|label| *label == LOCALHOST) {
            // Bare `localhost` has nothing in front of it and fails outright.
            return match pos.checked_sub(1).map(|prev| labels[prev]) {
                Some(label) if !label.is_empty() => {
                    Some(Resolution::Localhost(TenantId::from(label)))
                }
                _ => None,
            };
        }
    }

    let first = labels.first().copied().filter(|label| !label.is_empty())?;
    match labels.len() {
        0 | 1 => None,
        2 => Some(Resolution::ApexDomain(TenantId::from(first))),
        _ => Some(Resolution::Subdomain(TenantId::from(first))),
    }
}

/// Lower-case host with scheme, path, port and trailing dot removed. A
/// leading `www` stays an ordinary label.
fn normalize_host(raw: &str) -> Option<String> {
    let mut host = raw.trim();
    if let Some((_, rest)) = host.split_once("://") {
        host = rest;
    }
    if let Some(end) = host.find(['/', '?', '#']) {
        host = &host[..end];
    }
    if let Some((name, port)) = host.rsplit_once(':') {
        if !port.is_empty() && port.bytes().all(|b| b.is_ascii_digit()) {
            host = name;
        }
    }
    let host = host.trim_end_matches('.').to_ascii_lowercase();
    if host.is_empty() { None } else { Some(host) }
}
