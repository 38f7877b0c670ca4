// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 stagegraph contributors

//! Pipeline descriptors
//!
//! The serialized form of a pipeline: `apiVersion`, `kind`, `metadata` and
//! `spec`, with the stage list keyed by stage name.

mod definition;
mod validation;
mod value;

pub use definition::*;
pub use validation::{DescriptorValidator, ValidationResult};
pub use value::{ConfigMap, ConfigValue};
