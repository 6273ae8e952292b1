//! Identifiers of the records automations refer to.
//!
//! Definitions reference devices, volumes and playbooks by UUID, so every
//! id is a distinct newtype over [`uuid::Uuid`] and one kind cannot be
//! passed where another is expected. Container ids are runtime-assigned and
//! stay plain strings (see [`Container`](crate::container::Container)).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Uuid);

        impl $name {
            /// A fresh random (v4) id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            #[must_use]
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            #[must_use]
            pub fn as_uuid(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                fmt::Display::fmt(&self.0.hyphenated(), f)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }
    };
}

uuid_id!(
    /// Identifies a stored [`Automation`](crate::automation::Automation).
    AutomationId
);

uuid_id!(
    /// A managed device; playbook actions target devices.
    DeviceId
);

uuid_id!(
    /// A [`Volume`](crate::container::Volume) on a managed device.
    VolumeId
);

uuid_id!(
    /// A stored [`Playbook`](crate::playbook::Playbook).
    PlaybookId
);

uuid_id!(
    /// A dashboard [`User`](crate::user::User).
    UserId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_differ_when_generated_twice() {
        assert_ne!(AutomationId::new(), AutomationId::new());
    }

    #[test]
    fn should_parse_hyphenated_form_it_displays() {
        let id = DeviceId::new();
        assert_eq!(id.to_string().parse::<DeviceId>(), Ok(id));
    }

    #[test]
    fn should_ignore_surrounding_whitespace_when_parsing() {
        let uuid = Uuid::new_v4();
        let parsed: PlaybookId = format!("  {uuid}\n").parse().unwrap();
        assert_eq!(parsed.as_uuid(), uuid);
    }

    #[test]
    fn should_serialize_as_bare_uuid_string() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&VolumeId::from(uuid)).unwrap();
        assert_eq!(json, format!("\"{uuid}\""));
    }

    #[test]
    fn should_reject_malformed_uuid() {
        assert!("volume-1".parse::<VolumeId>().is_err());
    }
}
