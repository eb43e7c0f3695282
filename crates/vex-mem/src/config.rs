//! Configuration Module - Address-Space Parameters
//!
//! Manages the tunable parameters of one simulated address space.
//! The defaults match the common simulated-machine setup (4KB pages).

use crate::error::{Result, VmError};
use crate::page::{PAGE_SIZE, SUB_REGION_SIZE};

/// Configuration for one simulated address space
///
/// # Examples
///
/// ```rust
/// use vex_mem::MemConfig;
///
/// // Default configuration (4KB pages)
/// let config = MemConfig::default();
/// assert!(config.validate().is_ok());
///
/// // Custom page size
/// let config = MemConfig { page_size: 8 * 1024 };
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemConfig {
    /// Simulated page size in bytes
    ///
    /// Must be a power of two and divide the 16KB tracking granularity, so
    /// every tracked region splits into whole pages.
    ///
    /// Default: 4KB
    pub page_size: u64,
}

impl MemConfig {
    /// Validate configuration parameters
    ///
    /// # Returns
    /// `Ok(())` if the parameters are usable, `VmError::Configuration` with a
    /// description otherwise.
    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 || !self.page_size.is_power_of_two() {
            return Err(VmError::Configuration(format!(
                "page size {} is not a power of two",
                self.page_size
            )));
        }
        if SUB_REGION_SIZE % self.page_size != 0 {
            return Err(VmError::Configuration(format!(
                "page size {} does not divide the {}B tracking granularity",
                self.page_size, SUB_REGION_SIZE
            )));
        }
        Ok(())
    }
}

impl Default for MemConfig {
    fn default() -> Self {
        Self { page_size: PAGE_SIZE }
    }
}
