//! Checkpoint Container - Named-Section Scalar Store
//!
//! A nested key/value store of named sections holding scalar parameters,
//! used to persist and restore simulator state deterministically. This
//! module only provides the container; the page-map field layout written
//! into it lives with the address space.
//!
//! Whole checkpoints round-trip through JSON via serde, so saved state can
//! be written to disk, diffed, and restored bit-exactly.

use crate::error::{Result, VmError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One named section: scalar parameters plus nested subsections
///
/// Section and parameter names are ordered (BTreeMap) so encoding the same
/// state always produces the same bytes.
///
/// # Examples
///
/// ```rust
/// use vex_mem::checkpoint::Section;
///
/// let mut cp = Section::new();
/// let sec = cp.section_mut("ptable");
/// sec.write_param("size", 2);
///
/// assert_eq!(cp.section("ptable").unwrap().read_param("size").unwrap(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Scalar parameters in this section
    #[serde(default)]
    params: BTreeMap<String, u64>,
    /// Nested named subsections
    #[serde(default)]
    sections: BTreeMap<String, Section>,
}

impl Section {
    /// Create an empty section
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a scalar parameter, overwriting any previous value
    pub fn write_param(&mut self, name: &str, value: u64) {
        self.params.insert(name.to_string(), value);
    }

    /// Read a scalar parameter
    ///
    /// # Returns
    /// The value, or `VmError::MissingParam` if the parameter was never
    /// written.
    pub fn read_param(&self, name: &str) -> Result<u64> {
        self.params
            .get(name)
            .copied()
            .ok_or_else(|| VmError::MissingParam { name: name.to_string() })
    }

    /// Enter the named subsection for writing, creating it if absent
    pub fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_string()).or_default()
    }

    /// Enter the named subsection for reading
    ///
    /// # Returns
    /// The subsection, or `VmError::MissingSection` if it does not exist.
    pub fn section(&self, name: &str) -> Result<&Section> {
        self.sections
            .get(name)
            .ok_or_else(|| VmError::MissingSection { name: name.to_string() })
    }

    /// Check if the named subsection exists
    pub fn has_section(&self, name: &str) -> bool {
        self.sections.contains_key(name)
    }

    /// Encode the section tree as JSON
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| VmError::CheckpointFormat(e.to_string()))
    }

    /// Decode a section tree from JSON
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| VmError::CheckpointFormat(e.to_string()))
    }
}
