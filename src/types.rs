/// Shared types used across the codebase
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid {kind} '{value}'. Allowed: {allowed}")]
pub struct InvalidValue {
    pub kind: &'static str,
    pub value: String,
    pub allowed: String,
}

/// Closed string vocabulary stored as TEXT and exchanged as a JSON string.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident, $kind:literal, default = $default:ident, { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = InvalidValue;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(InvalidValue {
                        kind: $kind,
                        value: other.to_string(),
                        allowed: [$($text),+].join(", "),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = InvalidValue;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

text_enum!(
    /// Account role.
    Role, "role", default = User, {
        User => "user",
        Admin => "admin",
    }
);

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

text_enum!(ReportPriority, "priority", default = Secondaire, {
    Urgent => "urgent",
    Important => "important",
    Secondaire => "secondaire",
    PeuImportant => "peu important",
    SansInteret => "sans interet",
});

text_enum!(ReportStatus, "status", default = Pending, {
    Pending => "pending",
    InProgress => "in_progress",
    Resolved => "resolved",
});

text_enum!(TodoPriority, "priority", default = Secondaire, {
    Urgent => "urgent",
    Important => "important",
    Secondaire => "secondaire",
});

text_enum!(TodoStatus, "status", default = Pending, {
    Pending => "pending",
    Resolved => "resolved",
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_round_trips_through_text() {
        for role in Role::ALL {
            assert_eq!(role.as_str().parse::<Role>().unwrap(), *role);
        }
        for priority in ReportPriority::ALL {
            assert_eq!(priority.as_str().parse::<ReportPriority>().unwrap(), *priority);
        }
        for status in ReportStatus::ALL {
            assert_eq!(status.as_str().parse::<ReportStatus>().unwrap(), *status);
        }
        for priority in TodoPriority::ALL {
            assert_eq!(priority.as_str().parse::<TodoPriority>().unwrap(), *priority);
        }
        for status in TodoStatus::ALL {
            assert_eq!(status.as_str().parse::<TodoStatus>().unwrap(), *status);
        }
    }

    #[test]
    fn role_parsing_is_closed() {
        assert!("Admin".parse::<Role>().is_err());
        assert!("root".parse::<Role>().is_err());
        assert!("".parse::<Role>().is_err());
        assert_eq!(Role::default(), Role::User);
        assert!(Role::Admin.is_admin());
        assert!(!Role::User.is_admin());
    }

    #[test]
    fn todo_priority_is_narrower_than_report_priority() {
        assert!("peu important".parse::<ReportPriority>().is_ok());
        let err = "peu important".parse::<TodoPriority>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid priority 'peu important'. Allowed: urgent, important, secondaire"
        );
    }

    #[test]
    fn serializes_as_plain_strings() {
        assert_eq!(serde_json::to_value(ReportStatus::InProgress).unwrap(), "in_progress");
        let parsed: ReportPriority = serde_json::from_str("\"sans interet\"").unwrap();
        assert_eq!(parsed, ReportPriority::SansInteret);
        assert!(serde_json::from_str::<TodoStatus>("\"done\"").is_err());
    }
}
