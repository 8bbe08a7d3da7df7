// Axie Class - the closed set of nine destinations
//
// Every listing carries a class tag. Each recognized tag maps to exactly one
// store; anything else is a malformed record.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// CLASS TAG
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AxieClass {
    Beast,
    Aquatic,
    Plant,
    Bird,
    Bug,
    Reptile,
    Mech,
    Dawn,
    Dusk,
}

impl AxieClass {
    /// All nine classes, in the order stores are scanned during retrieval
    pub const ALL: [AxieClass; 9] = [
        AxieClass::Beast,
        AxieClass::Aquatic,
        AxieClass::Plant,
        AxieClass::Bird,
        AxieClass::Bug,
        AxieClass::Reptile,
        AxieClass::Mech,
        AxieClass::Dawn,
        AxieClass::Dusk,
    ];

    /// Resolve an upstream class tag. Matching is exact, as the marketplace sends it.
    pub fn from_tag(tag: &str) -> Option<AxieClass> {
        match tag {
            "Beast" => Some(AxieClass::Beast),
            "Aquatic" => Some(AxieClass::Aquatic),
            "Plant" => Some(AxieClass::Plant),
            "Bird" => Some(AxieClass::Bird),
            "Bug" => Some(AxieClass::Bug),
            "Reptile" => Some(AxieClass::Reptile),
            "Mech" => Some(AxieClass::Mech),
            "Dawn" => Some(AxieClass::Dawn),
            "Dusk" => Some(AxieClass::Dusk),
            _ => None,
        }
    }

    /// Tag as used on the wire and as the retrieval mapping key
    pub fn as_str(&self) -> &'static str {
        match self {
            AxieClass::Beast => "Beast",
            AxieClass::Aquatic => "Aquatic",
            AxieClass::Plant => "Plant",
            AxieClass::Bird => "Bird",
            AxieClass::Bug => "Bug",
            AxieClass::Reptile => "Reptile",
            AxieClass::Mech => "Mech",
            AxieClass::Dawn => "Dawn",
            AxieClass::Dusk => "Dusk",
        }
    }

    /// Backing table for this class's store
    pub fn table_name(&self) -> &'static str {
        match self {
            AxieClass::Beast => "beast_classes",
            AxieClass::Aquatic => "aquatic_classes",
            AxieClass::Plant => "plant_classes",
            AxieClass::Bird => "bird_classes",
            AxieClass::Bug => "bug_classes",
            AxieClass::Reptile => "reptile_classes",
            AxieClass::Mech => "mech_classes",
            AxieClass::Dawn => "dawn_classes",
            AxieClass::Dusk => "dusk_classes",
        }
    }
}

impl fmt::Display for AxieClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_every_class_round_trips_through_its_tag() {
        for class in AxieClass::ALL {
            assert_eq!(AxieClass::from_tag(class.as_str()), Some(class));
        }
    }

    #[test]
    fn test_unknown_tags_are_rejected() {
        assert_eq!(AxieClass::from_tag("Unknown"), None);
        assert_eq!(AxieClass::from_tag("beast"), None);
        assert_eq!(AxieClass::from_tag(""), None);
    }

    #[test]
    fn test_tables_are_disjoint() {
        let tables: HashSet<_> = AxieClass::ALL.iter().map(|c| c.table_name()).collect();
        assert_eq!(tables.len(), 9);
    }
}
