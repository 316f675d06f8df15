use std::fmt;

use camino::Utf8PathBuf;

use crate::code::EmoteCode;
use crate::remote::SlotId;

/// One remote change computed by reconciliation.
///
/// Mutations are independent and idempotent to retry: re-issuing a
/// create with the same name and binary, or a delete with the same id,
/// has no effect beyond the first successful application.
#[derive(Clone, Debug)]
pub enum Mutation {
    Create {
        name: EmoteCode,
        /// Cache path of the selected binary variant.
        handle: Utf8PathBuf,
    },
    Delete {
        name: String,
        id: SlotId,
    },
}

impl Mutation {
    pub fn kind(&self) -> MutationKind {
        match self {
            Self::Create { .. } => MutationKind::Create,
            Self::Delete { .. } => MutationKind::Delete,
        }
    }

    /// Display name the mutation acts on, for reporting.
    pub fn name(&self) -> &str {
        match self {
            Self::Create { name, .. } => name.as_str(),
            Self::Delete { name, .. } => name,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MutationKind {
    Create,
    Delete,
}

impl fmt::Display for MutationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Create => f.pad("create"),
            Self::Delete => f.pad("delete"),
        }
    }
}
