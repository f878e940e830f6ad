//! Version 46 -> 47: attribute metadata gains a `maxLength` column

use async_trait::async_trait;

use crate::postgresql::naming::quote;
use crate::postgresql::types::DEFAULT_STRING_LENGTH;
use crate::storage::SqlTransaction;
use crate::upgrade::UpgradeStep;
use crate::Result;

/// Table holding the attribute metadata
pub const ATTRIBUTE_METADATA_TABLE: &str = "sys_md_Attribute#c8d9a252";
/// Id of the attribute metadata entity type
pub const ATTRIBUTE_METADATA: &str = "sys_md_Attribute";
pub const MAX_LENGTH: &str = "maxLength";

/// Adds the `maxLength` column to the attribute metadata table, registers
/// it as an attribute of the attribute metadata entity type and backfills
/// string-like attributes with the previous implicit length
pub struct Step47AddMaxLength {
    default_string_length: u32,
}

impl Step47AddMaxLength {
    pub fn new() -> Self {
        Self {
            default_string_length: DEFAULT_STRING_LENGTH,
        }
    }

    pub fn with_default_string_length(mut self, length: u32) -> Self {
        self.default_string_length = length;
        self
    }

    /// Statements in execution order; each one is safe to re-run
    pub fn statements(&self) -> Vec<String> {
        let table = quote(ATTRIBUTE_METADATA_TABLE);
        let column = quote(MAX_LENGTH);
        vec![
            format!("ALTER TABLE {table} ADD COLUMN IF NOT EXISTS {column} integer"),
            format!(
                "INSERT INTO {table} (\"id\",\"entity\",\"name\",\"type\",\"isNullable\",\"isAuto\",\"isVisible\",\"isReadOnly\",\"isUnique\") \
                 VALUES ('{MAX_LENGTH}','{ATTRIBUTE_METADATA}','{MAX_LENGTH}','int',true,false,true,false,false) \
                 ON CONFLICT (\"id\") DO NOTHING"
            ),
            format!(
                "UPDATE {table} SET {column} = {} WHERE \"type\" IN ('string','email','hyperlink','enum') AND {column} IS NULL",
                self.default_string_length
            ),
        ]
    }
}

impl Default for Step47AddMaxLength {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UpgradeStep for Step47AddMaxLength {
    fn from_version(&self) -> u32 {
        46
    }

    fn description(&self) -> &str {
        "Add maxLength to attribute metadata"
    }

    async fn upgrade(&self, tx: &mut dyn SqlTransaction) -> Result<()> {
        for sql in self.statements() {
            log::debug!("Step 47: {}", sql);
            tx.execute(&sql).await?;
        }
        Ok(())
    }
}
