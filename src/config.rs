//! Configuration for devicedb
//!
//! Centralized configuration with sensible defaults.
//!
//! Cache capacities are per section and count entries, not bytes. The
//! defaults are sized for a lookup-service workload where the string, node,
//! and signature caches absorb most of the traffic.

/// Cache sizing for a loaded store
#[derive(Debug, Clone)]
pub struct Config {
    // -------------------------------------------------------------------------
    // Cache Capacities (entries)
    // -------------------------------------------------------------------------
    /// Capacity of the string section cache
    pub string_cache_size: usize,

    /// Capacity of the value section cache
    pub value_cache_size: usize,

    /// Capacity of the profile section cache
    pub profile_cache_size: usize,

    /// Capacity of the signature section cache
    pub signature_cache_size: usize,

    /// Capacity of the node section cache
    pub node_cache_size: usize,

    /// Capacity of each integer index-section cache (ranked signature
    /// indexes, signature node offsets, node ranked-signature indexes)
    pub index_cache_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            string_cache_size: 5_000,
            value_cache_size: 2_000,
            profile_cache_size: 2_000,
            signature_cache_size: 4_000,
            node_cache_size: 8_000,
            index_cache_size: 4_000,
        }
    }
}

impl Config {
    /// Create a new config builder
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::default()
    }
}

/// Builder for Config
#[derive(Default)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Set the string cache capacity (entries)
    pub fn string_cache_size(mut self, size: usize) -> Self {
        self.config.string_cache_size = size;
        self
    }

    /// Set the value cache capacity (entries)
    pub fn value_cache_size(mut self, size: usize) -> Self {
        self.config.value_cache_size = size;
        self
    }

    /// Set the profile cache capacity (entries)
    pub fn profile_cache_size(mut self, size: usize) -> Self {
        self.config.profile_cache_size = size;
        self
    }

    /// Set the signature cache capacity (entries)
    pub fn signature_cache_size(mut self, size: usize) -> Self {
        self.config.signature_cache_size = size;
        self
    }

    /// Set the node cache capacity (entries)
    pub fn node_cache_size(mut self, size: usize) -> Self {
        self.config.node_cache_size = size;
        self
    }

    /// Set the integer index-section cache capacity (entries)
    pub fn index_cache_size(mut self, size: usize) -> Self {
        self.config.index_cache_size = size;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}
