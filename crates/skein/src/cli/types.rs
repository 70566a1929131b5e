//! CLI value enums and domain type conversions.

use clap::ValueEnum;

use crate::domain::DependencyType;

/// Dependency type for CLI arguments
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DependencyTypeArg {
    /// Source must complete before target can proceed
    #[default]
    Blocks,
    /// Source cannot complete until target completes
    Requires,
}

impl std::fmt::Display for DependencyTypeArg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(DependencyType::from(*self).as_str())
    }
}

impl From<DependencyTypeArg> for DependencyType {
    fn from(arg: DependencyTypeArg) -> Self {
        match arg {
            DependencyTypeArg::Blocks => DependencyType::Blocks,
            DependencyTypeArg::Requires => DependencyType::Requires,
        }
    }
}

impl From<DependencyType> for DependencyTypeArg {
    fn from(d: DependencyType) -> Self {
        match d {
            DependencyType::Blocks => DependencyTypeArg::Blocks,
            DependencyType::Requires => DependencyTypeArg::Requires,
        }
    }
}
