//! Strongly typed, zero-cost identifier wrappers.
//!
//! Node keys coming from a traffic feed are arbitrary strings (an
//! intersection key or a stringified coordinate pair).  The graph interns
//! each key once and hands out a dense `NodeId`, so every search can use
//! `Vec`-indexed distance tables instead of hashing on the hot path.
//! Edges get their own `EdgeId` because the network tolerates parallel
//! edges between the same ordered pair.

use std::fmt;

/// Generate a typed ID wrapper around a primitive integer.
macro_rules! typed_id {
    ($(#[$attr:meta])* $vis:vis struct $name:ident($inner:ty);) => {
        $(#[$attr])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        $vis struct $name(pub $inner);

        impl $name {
            /// Sentinel meaning "no valid ID", equal to `MAX`.
            pub const INVALID: $name = $name(<$inner>::MAX);

            /// Cast to `usize` for direct use as a `Vec` index.
            #[inline(always)]
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl Default for $name {
            /// Returns the `INVALID` sentinel so uninitialized IDs are visibly invalid.
            #[inline(always)]
            fn default() -> Self {
                Self::INVALID
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl TryFrom<usize> for $name {
            type Error = std::num::TryFromIntError;
            fn try_from(n: usize) -> Result<$name, Self::Error> {
                <$inner>::try_from(n).map($name)
            }
        }
    };
}

typed_id! {
    /// Interned index of a road-network node (intersection).
    pub struct NodeId(u32);
}

typed_id! {
    /// Unique handle of one directed edge, stable for the graph's lifetime.
    pub struct EdgeId(u32);
}
