//! Status helper enums mapping to SMALLINT lookup tables.
//!
//! Each enum variant's discriminant matches the seed data order (1-based)
//! in the corresponding `*_statuses` database table.

use std::str::FromStr;

use jobrelay_core::error::CoreError;

/// Status ID type matching SMALLINT/SMALLSERIAL in the database.
pub type StatusId = i16;

macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident = $val:expr => $label:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(i16)]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $( $(#[$vmeta])* $variant = $val ),+
        }

        impl $name {
            /// Every variant in seed order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Return the database status ID.
            pub fn id(self) -> StatusId {
                self as StatusId
            }

            /// Return the lookup-table `name` for this status.
            pub fn name(self) -> &'static str {
                match self {
                    $( $name::$variant => $label ),+
                }
            }

            /// Map a database status ID back to the enum.
            pub fn from_id(id: StatusId) -> Option<Self> {
                Self::ALL.iter().copied().find(|s| s.id() == id)
            }
        }

        impl From<$name> for StatusId {
            fn from(value: $name) -> Self {
                value as StatusId
            }
        }

        impl FromStr for $name {
            type Err = CoreError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::ALL
                    .iter()
                    .copied()
                    .find(|v| v.name() == s)
                    .ok_or_else(|| {
                        let names: Vec<&str> = Self::ALL.iter().map(|v| v.name()).collect();
                        CoreError::Validation(format!(
                            "Unknown {} '{s}'. Must be one of: {}",
                            stringify!($name),
                            names.join(", ")
                        ))
                    })
            }
        }
    };
}

define_status_enum! {
    /// Background job execution status.
    ///
    /// Transitions only move forward: pending -> started -> success | failure.
    JobStatus {
        Pending = 1 => "pending",
        Started = 2 => "started",
        Success = 3 => "success",
        Failure = 4 => "failure",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_match_seed_order() {
        assert_eq!(JobStatus::Pending.id(), 1);
        assert_eq!(JobStatus::Started.id(), 2);
        assert_eq!(JobStatus::Success.id(), 3);
        assert_eq!(JobStatus::Failure.id(), 4);
    }

    #[test]
    fn test_from_id_and_name() {
        assert_eq!(JobStatus::from_id(3), Some(JobStatus::Success));
        assert_eq!(JobStatus::from_id(9), None);
        assert_eq!("failure".parse::<JobStatus>().unwrap(), JobStatus::Failure);
        assert!("running".parse::<JobStatus>().is_err());
    }
}
