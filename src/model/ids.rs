//! Newtype identifiers for model records.

use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wraps the given string.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id! {
    /// Unique device identity (MAC address or hardware id in most deployments).
    DeviceId
}

string_id! {
    /// Identifier of a [`Template`](super::Template).
    TemplateId
}

string_id! {
    /// Identifier of a [`VpnServer`](super::VpnServer).
    VpnServerId
}

string_id! {
    /// Identifier of an organization (tenant).
    OrgId
}

string_id! {
    /// Identifier of a [`DeviceGroup`](super::DeviceGroup).
    GroupId
}

string_id! {
    /// Configuration backend identifier (e.g. `netjsonconfig.OpenWrt`).
    ///
    /// Configurations and the templates attached to them must share a backend.
    Backend
}
