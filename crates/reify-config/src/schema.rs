use schemars::schema::RootSchema;
use schemars::schema_for;

use crate::ReifyConfig;

/// JSON schema for the TOML configuration file, for editor tooling and CI validation.
#[must_use]
pub fn json_schema() -> RootSchema {
    schema_for!(ReifyConfig)
}
