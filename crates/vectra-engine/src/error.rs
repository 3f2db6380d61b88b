//! Error types for the bridge core.
//!
//! Two families exist:
//! - [`DecodeError`]: metadata that points outside (or misaligned within) the
//!   foreign memory block. Recoverable; the frame simply draws less.
//! - [`PassError`]: a render pass could not build its GPU program. Fatal for
//!   that pass; callers disable the primitive kind instead of retrying.
//!
//! Empty buffers and null pointers are *not* errors anywhere in this crate.

use thiserror::Error;

/// Foreign-memory access failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// `offset + len` runs past the end of the current memory block.
    #[error("range {offset:#x}+{len} exceeds memory block of {available} bytes")]
    OutOfBounds {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// A typed view was requested at an address the element type cannot live at.
    #[error("address {ptr:#x} is not {align}-byte aligned")]
    Misaligned { ptr: usize, align: usize },

    /// A producer-side allocation would end past the 32-bit pointer range.
    #[error("offset {offset:#x} does not fit a 32-bit pointer")]
    PointerOverflow { offset: usize },
}

/// Render pass construction failure.
///
/// Only produced by `initialize()`; the per-frame path never returns errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PassError {
    #[error("{label}: shader module failed to compile: {message}")]
    ShaderCompile { label: &'static str, message: String },

    #[error("{label}: pipeline failed to link: {message}")]
    PipelineLink { label: &'static str, message: String },

    #[error("{label}: required binding `{name}` is not declared by the shader")]
    MissingBinding {
        label: &'static str,
        name: &'static str,
    },

    #[error("{label}: invalid vertex layout: {reason}")]
    InvalidLayout { label: &'static str, reason: String },
}

impl PassError {
    /// Label of the pass/program that failed.
    pub fn label(&self) -> &'static str {
        match self {
            PassError::ShaderCompile { label, .. }
            | PassError::PipelineLink { label, .. }
            | PassError::MissingBinding { label, .. }
            | PassError::InvalidLayout { label, .. } => label,
        }
    }
}
