use std::{fmt, str::FromStr};

use uuid::Uuid;

use crate::error::ModelError;

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Copy)]
        #[cfg_attr(
            feature = "serde",
            derive(serde::Serialize, serde::Deserialize),
            serde(transparent)
        )]
        pub struct $name(pub Uuid);

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl $name {
            /// Mint a fresh, time-ordered identifier.
            pub fn new() -> Self {
                $name(Uuid::now_v7())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }

            pub fn to_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                $name(id)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl FromStr for $name {
            type Err = ModelError;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                if raw.trim().is_empty() {
                    return Err(ModelError::Parse(format!(
                        "{} ID cannot be empty",
                        $label
                    )));
                }
                Uuid::parse_str(raw.trim()).map($name).map_err(|err| {
                    ModelError::Parse(format!("invalid {} ID: {err}", $label))
                })
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

entity_id!(
    /// Strongly typed ID for user accounts (also the actor id on audit fields)
    UserID,
    "user"
);
entity_id!(
    /// Strongly typed ID for courses
    CourseID,
    "course"
);
entity_id!(
    /// Strongly typed ID for videos belonging to a course
    VideoID,
    "video"
);
entity_id!(
    /// Strongly typed ID for faculties
    FacultyID,
    "faculty"
);
entity_id!(
    /// Strongly typed ID for majors offered by a faculty
    MajorID,
    "major"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_displays_round_trip() {
        let id = CourseID::new();
        let parsed: CourseID = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn rejects_empty_and_garbage() {
        assert!(matches!(
            "".parse::<VideoID>(),
            Err(ModelError::Parse(msg)) if msg.contains("video")
        ));
        assert!("not-a-uuid".parse::<UserID>().is_err());
    }

    #[test]
    fn new_ids_are_time_ordered() {
        let first = MajorID::new();
        let second = MajorID::new();
        assert!(first <= second);
        assert_ne!(first, second);
    }
}
