//! Upgrade steps shipped with the data core

mod step47_add_max_length;

pub use step47_add_max_length::{Step47AddMaxLength, ATTRIBUTE_METADATA, ATTRIBUTE_METADATA_TABLE, MAX_LENGTH};

use std::sync::Arc;

use super::UpgradeStep;

/// All shipped steps in version order
pub fn builtin_steps(default_string_length: u32) -> Vec<Arc<dyn UpgradeStep>> {
    vec![Arc::new(
        Step47AddMaxLength::new().with_default_string_length(default_string_length),
    )]
}
