//! # Pool Configuration
//!
//! Sizing knobs for a [`Pool`](crate::Pool). Usually built in code; search
//! harnesses that tune node storage per map load it from TOML once at startup:
//!
//! ```toml
//! object_size = 32
//! initial_blocks = 4
//! block_bytes = 262144
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{PoolError, PoolResult};

/// Default Block region size: 1 MiB.
pub const DEFAULT_BLOCK_BYTES: usize = 1024 * 1024;

/// Default number of Blocks created up front.
pub const DEFAULT_INITIAL_BLOCKS: usize = 20;

/// Configuration for a pool.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Size of every object in bytes.
    pub object_size: usize,
    /// Blocks created at construction; also the initial capacity of the
    /// Block reference array, which doubles when exceeded.
    #[serde(default = "default_initial_blocks")]
    pub initial_blocks: usize,
    /// Requested region size of each Block. Raised to `object_size` if smaller.
    #[serde(default = "default_block_bytes")]
    pub block_bytes: usize,
}

const fn default_initial_blocks() -> usize {
    DEFAULT_INITIAL_BLOCKS
}

const fn default_block_bytes() -> usize {
    DEFAULT_BLOCK_BYTES
}

impl PoolConfig {
    /// Defaults for objects of `object_size` bytes.
    #[must_use]
    pub const fn for_object_size(object_size: usize) -> Self {
        Self {
            object_size,
            initial_blocks: DEFAULT_INITIAL_BLOCKS,
            block_bytes: DEFAULT_BLOCK_BYTES,
        }
    }

    /// Sets the number of Blocks created up front.
    #[must_use]
    pub const fn with_initial_blocks(self, initial_blocks: usize) -> Self {
        Self {
            initial_blocks,
            ..self
        }
    }

    /// Sets the requested Block region size.
    #[must_use]
    pub const fn with_block_bytes(self, block_bytes: usize) -> Self {
        Self {
            block_bytes,
            ..self
        }
    }

    /// Region size new Blocks are created with: at least one object.
    #[inline]
    #[must_use]
    pub fn effective_block_bytes(&self) -> usize {
        self.block_bytes.max(self.object_size)
    }

    /// Checks the configuration can build a pool.
    pub fn validate(&self) -> PoolResult<()> {
        if self.object_size == 0 {
            return Err(PoolError::InvalidConfig(
                "object_size must be greater than zero".to_string(),
            ));
        }
        if self.initial_blocks == 0 {
            return Err(PoolError::InvalidConfig(
                "initial_blocks must be greater than zero".to_string(),
            ));
        }

        let block_bytes = self.effective_block_bytes();
        let region = block_bytes - block_bytes % self.object_size;
        if u32::try_from(region).is_err() {
            return Err(PoolError::InvalidConfig(format!(
                "block region of {region} bytes exceeds the u32 offset range"
            )));
        }
        Ok(())
    }

    /// Parses and validates a TOML document.
    pub fn from_toml_str(source: &str) -> PoolResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| PoolError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn from_toml_file(path: impl AsRef<Path>) -> PoolResult<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)
            .map_err(|e| PoolError::InvalidConfig(format!("{}: {e}", path.display())))?;
        Self::from_toml_str(&source)
    }
}
