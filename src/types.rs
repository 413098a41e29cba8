//! Identifier newtypes for platform resources to avoid stringly-typed code.

use std::fmt;
use std::ops::Deref;

macro_rules! newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
        pub struct $name(String);

        impl $name {
            /// Wraps a raw identifier, trimming surrounding whitespace.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into().trim().to_owned())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }

            /// Returns `true` when the identifier is blank.
            #[must_use]
            pub fn is_empty(&self) -> bool {
                self.0.is_empty()
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self::new(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl Deref for $name {
            type Target = str;
            fn deref(&self) -> &Self::Target {
                self.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

newtype!(
    /// Block-storage volume identifier assigned by the platform.
    VolumeId
);
newtype!(
    /// Compute instance (server) identifier.
    InstanceId
);
newtype!(
    /// Identifier of a single volume attachment record.
    AttachmentId
);
newtype!(
    /// Volume snapshot identifier.
    SnapshotId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_trims_whitespace() {
        let id = VolumeId::new("  vol-1 \n");
        assert_eq!(id.as_str(), "vol-1");
        assert!(!id.is_empty());
    }

    #[test]
    fn blank_identifier_reports_empty() {
        assert!(InstanceId::from("   ").is_empty());
    }

    #[test]
    fn display_matches_inner_value() {
        assert_eq!(SnapshotId::from("snap-9").to_string(), "snap-9");
    }
}
