//! Debug dump of synthesized types
//!
//! When `dump_dir` is configured, every synthesized type is written as
//! `<name>.MapDescriptor.json`: its backing fields, accessor bodies and
//! constructor plans, one line per step.

use crate::emit::descriptor::Descriptor;
use crate::error::EmitError;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Backing field added by synthesis
#[derive(Debug, Clone, Serialize)]
pub struct FieldReport {
    /// Slot in the instance layout
    pub slot: usize,
    /// Field name
    pub name: String,
    /// Field type name
    pub ty: String,
}

/// Synthesized property
#[derive(Debug, Clone, Serialize)]
pub struct PropertyReport {
    /// Property name
    pub name: String,
    /// Declared property type
    pub ty: String,
    /// Backing field
    pub field: String,
    /// Value member of the wrapper, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wrapper_member: Option<String>,
    /// Getter body
    pub getter: String,
    /// Setter body; absent when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub setter: Option<String>,
}

/// Everything synthesis decided for one type
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisReport {
    /// Synthesized type name
    pub type_name: String,
    /// Abstract type it implements
    pub original: String,
    /// Inherited serializable flag
    pub serializable: bool,
    /// Backing fields
    pub fields: Vec<FieldReport>,
    /// Synthesized properties
    pub properties: Vec<PropertyReport>,
    /// Zero-argument constructor body
    pub default_constructor: Vec<String>,
    /// Initializing-data constructor body
    pub factory_constructor: Vec<String>,
    /// Property-info steps
    pub init_routine: Vec<String>,
    /// Owned member fields
    pub created_members: Vec<String>,
}

#[derive(Serialize)]
struct DescriptorDump<'a> {
    original: &'a str,
    mapped: &'a str,
    can_create: bool,
    can_create_with: bool,
    #[serde(flatten)]
    report: &'a SynthesisReport,
}

/// File name of the dump for `type_name`
pub fn dump_file_name(type_name: &str) -> String {
    format!("{}.MapDescriptor.json", type_name)
}

/// Write the dump of a synthesized descriptor into `dir`
///
/// Returns `Ok(None)` for descriptors of concrete types, which have nothing
/// synthesized to show.
pub fn write_dump(dir: &Path, descriptor: &Descriptor) -> Result<Option<PathBuf>, EmitError> {
    let Some(report) = descriptor.report() else {
        return Ok(None);
    };

    let dump = DescriptorDump {
        original: descriptor.original_type().name(),
        mapped: descriptor.mapped_type().name(),
        can_create: descriptor.can_create(),
        can_create_with: descriptor.can_create_with(),
        report,
    };

    fs::create_dir_all(dir)?;
    let path = dir.join(dump_file_name(&report.type_name));
    let json = serde_json::to_string_pretty(&dump)?;
    fs::write(&path, json)?;

    tracing::debug!(path = %path.display(), "wrote descriptor dump");
    Ok(Some(path))
}
