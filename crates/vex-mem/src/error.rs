//! Error Module - Faults and Failure Types
//!
//! Two classes of failure exist in this subsystem:
//!
//! - **Recoverable misses**: a translation for an address with no page-map
//!   entry. Surfaced as a [`PageFault`] value and handed to the memory-system
//!   caller, which decides whether to terminate the simulated program, grow
//!   its address space, or otherwise recover. Never a panic.
//! - **Fatal contract violations**: mapping over an existing page without
//!   clobber permission, remapping/unmapping pages that violate the
//!   preconditions, a request spanning a page boundary, unaligned address
//!   arguments. These indicate a bug in the simulated program or the caller
//!   and abort the simulation run via `panic!`.
//!
//! Checkpoint-format and configuration problems are ordinary [`VmError`]
//! results.

use crate::page::Addr;
use thiserror::Error;

/// Typed "page not present" signal for a failed translation
///
/// Carries the faulting virtual address. This is a value, not a panic: the
/// caller's fault-handling path consumes it.
///
/// # Examples
///
/// ```rust
/// use vex_mem::{AddressSpace, MemConfig};
///
/// let space = AddressSpace::new(MemConfig::default()).unwrap();
/// let fault = space.translate(0xdead_0000).unwrap_err();
/// assert_eq!(fault.vaddr, 0xdead_0000);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("page fault: no mapping for virtual address {vaddr:#x}")]
pub struct PageFault {
    /// Faulting virtual address
    pub vaddr: Addr,
}

/// Main error type for address-space operations
#[derive(Debug, Error)]
pub enum VmError {
    /// Translation miss, wrapped for callers that mix fault and
    /// checkpoint/configuration handling in one `Result` chain
    #[error(transparent)]
    Fault(#[from] PageFault),

    /// Invalid configuration detected
    ///
    /// **When returned:** `MemConfig::validate` rejects the parameters
    ///
    /// **Recovery strategy:** fix the configuration; there is no default
    /// fallback once construction has been attempted
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Checkpoint section missing during restore
    #[error("checkpoint is missing section `{name}`")]
    MissingSection { name: String },

    /// Checkpoint scalar parameter missing during restore
    #[error("checkpoint is missing parameter `{name}`")]
    MissingParam { name: String },

    /// Checkpoint container could not be encoded or decoded
    #[error("checkpoint format error: {0}")]
    CheckpointFormat(String),
}

impl VmError {
    /// Check if this error is an ordinary translation miss
    pub fn is_fault(&self) -> bool {
        matches!(self, VmError::Fault(_))
    }

    /// Check if this error indicates corrupt or incomplete checkpoint input
    pub fn is_checkpoint(&self) -> bool {
        matches!(
            self,
            VmError::MissingSection { .. }
                | VmError::MissingParam { .. }
                | VmError::CheckpointFormat(_)
        )
    }
}

/// Result type alias for address-space operations
pub type Result<T> = std::result::Result<T, VmError>;
