use std::fmt;

use serde::{Deserialize, Serialize};

// The external simulation names everything with opaque strings. Wrap them so an edge can't be
// passed where a person is expected.
macro_rules! string_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> $name {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> $name {
                $name(id.to_string())
            }
        }
    };
}

string_id!(EdgeID, "A directed network segment where vehicles drive and park.");
string_id!(VehicleID, "A vehicle, parked or moving.");
string_id!(PersonID, "A traveler; the driver of a vehicle.");

impl EdgeID {
    /// Transit infrastructure is imported with a naming convention instead of a flag in some
    /// networks, so recognize that too.
    pub fn looks_like_transit(&self) -> bool {
        self.0.starts_with("pt_") || self.0.contains("_pt_")
    }
}
