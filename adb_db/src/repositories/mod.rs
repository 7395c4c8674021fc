//! ABOUTME: Repository modules providing type-safe database operations
//! ABOUTME: One repository per entity family of the antibody/antigen schema

pub mod antibodies;
pub mod antigens;
pub mod binding_affinities;
pub mod cdrs;
pub mod chains;
pub mod methodology;
pub mod pdbs;
pub mod regions;
pub mod sequences;
pub mod structures;

use adb_core::{Error, Result};

/// Turn a zero-row update/delete into a NotFound error
pub(crate) fn require_affected(rows: u64, entity: &str, id: i64) -> Result<()> {
    if rows == 0 {
        return Err(Error::NotFound(format!("{} {} not found", entity, id)));
    }
    Ok(())
}

/// Longest stored file reference, matching the column CHECK constraints
pub const MAX_FILE_REFERENCE_LEN: usize = 100;

pub(crate) fn validate_file_reference(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::Validation(format!("{} must not be blank", field)));
    }
    if value.chars().count() > MAX_FILE_REFERENCE_LEN {
        return Err(Error::Validation(format!(
            "{} exceeds {} characters",
            field, MAX_FILE_REFERENCE_LEN
        )));
    }
    Ok(())
}
