use space_canon::TrustPolicy;
use space_layout::Region;
use space_types::TabDocument;

pub const ALLOW_SYSTEM_AUTHORED_ENV: &str = "SPACE_ALLOW_SYSTEM_AUTHORED";
pub const COMMIT_REPAIRS_ENV: &str = "SPACE_COMMIT_REPAIRS";

#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Which envelopes `load_*` accepts.
    pub trust_policy: TrustPolicy,
    /// Write a reconciled document straight back after loading it.
    pub commit_repairs: bool,
    /// Grid cells no fidget may occupy on load.
    pub reserved_regions: Vec<Region>,
    /// Seed for tabs that have never been committed.
    pub initial_document: TabDocument,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            trust_policy: TrustPolicy::Strict,
            commit_repairs: false,
            reserved_regions: Vec::new(),
            initial_document: TabDocument::empty(),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if env_flag(ALLOW_SYSTEM_AUTHORED_ENV) {
            config.trust_policy = TrustPolicy::AllowSystemAuthored;
        }
        config.commit_repairs = env_flag(COMMIT_REPAIRS_ENV);
        config
    }

    pub fn with_trust_policy(mut self, policy: TrustPolicy) -> Self {
        self.trust_policy = policy;
        self
    }

    pub fn with_commit_repairs(mut self, commit: bool) -> Self {
        self.commit_repairs = commit;
        self
    }

    pub fn with_reserved_regions(mut self, regions: Vec<Region>) -> Self {
        self.reserved_regions = regions;
        self
    }

    pub fn with_initial_document(mut self, document: TabDocument) -> Self {
        self.initial_document = document;
        self
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}
