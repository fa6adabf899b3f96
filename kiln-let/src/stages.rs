//  STAGES.rs
//    by the kiln authors
//
//  Created:
//    09 Mar 2026, 13:40:56
//  Last edited:
//    18 Jun 2026, 09:12:30
//  Auto updated?
//    Yes
//
//  Description:
//!   Defines the ordered stages of the in-container pipeline.
//

use std::fmt::{Display, Formatter, Result as FResult};


/***** TESTS *****/





/***** LIBRARY *****/
/// One step of the pipeline. Stages run strictly in declaration order and none may be skipped.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum Stage {
    /// Download the source archive.
    Fetch,
    /// Unpack the archive into the source root.
    Unpack,
    /// Apply the patches in order.
    Patch,
    /// Generate and adjust the `.config`.
    Configure,
    /// Build the targets and run the post-build tools.
    Compile,
    /// Place the outputs in the result directory.
    Export,
}

impl Stage {
    /// Returns the stage every run starts in.
    #[inline]
    pub const fn first() -> Self { Self::Fetch }

    /// Returns the stage after this one, or `None` if this is the last.
    pub const fn next(&self) -> Option<Self> {
        match self {
            Self::Fetch     => Some(Self::Unpack),
            Self::Unpack    => Some(Self::Patch),
            Self::Patch     => Some(Self::Configure),
            Self::Configure => Some(Self::Compile),
            Self::Compile   => Some(Self::Export),
            Self::Export    => None,
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> FResult {
        match self {
            Self::Fetch     => write!(f, "fetch"),
            Self::Unpack    => write!(f, "unpack"),
            Self::Patch     => write!(f, "patch"),
            Self::Configure => write!(f, "configure"),
            Self::Compile   => write!(f, "compile"),
            Self::Export    => write!(f, "export"),
        }
    }
}
