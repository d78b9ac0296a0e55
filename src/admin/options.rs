use crate::store::LoadOptions;

/// Common options used when opening a store for administrative commands.
#[derive(Clone, Debug, Default)]
pub struct AdminOpenOptions {
    /// How array files are materialized.
    pub load: LoadOptions,
}

impl AdminOpenOptions {
    /// Options that read every array into memory instead of mapping it.
    pub fn in_memory() -> Self {
        Self {
            load: LoadOptions::in_memory(),
        }
    }
}
