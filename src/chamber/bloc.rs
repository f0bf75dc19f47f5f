//! Party-bloc classification
//!
//! Maps a party code to its political bloc from a single shared membership
//! table. Earlier revisions carried several hand-copied lists that drifted
//! apart in spelling; everything now goes through `Bloc::from_party`.

use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

lazy_static! {
    /// Parties aligned with the government coalition
    static ref GOVERNMENT_PARTIES: HashSet<&'static str> = [
        "PT",
        "PCdoB",
        "PV",
        "PSB",
        "MDB",
        "PSD",
        "REPUBLICANOS",
        "PODE",
        "UNIÃO",
        "PSOL",
        "REDE",
    ]
    .into_iter()
    .collect();

    /// Parties in formal opposition
    static ref OPPOSITION_PARTIES: HashSet<&'static str> = ["PL", "PP", "NOVO"].into_iter().collect();
}

/// Political bloc derived from party affiliation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bloc {
    Government,
    Opposition,
    Independent,
}

impl Bloc {
    /// All blocs, in display order
    pub const ALL: [Bloc; 3] = [Bloc::Government, Bloc::Opposition, Bloc::Independent];

    /// Classify a party code into its bloc. Codes in neither membership
    /// list are Independent; there are no error conditions.
    pub fn from_party(party_code: &str) -> Bloc {
        if GOVERNMENT_PARTIES.contains(party_code) {
            Bloc::Government
        } else if OPPOSITION_PARTIES.contains(party_code) {
            Bloc::Opposition
        } else {
            Bloc::Independent
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Bloc::Government => "Government",
            Bloc::Opposition => "Opposition",
            Bloc::Independent => "Independent",
        }
    }
}

impl fmt::Display for Bloc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_lists_are_disjoint() {
        let overlap: Vec<_> = GOVERNMENT_PARTIES
            .intersection(&OPPOSITION_PARTIES)
            .collect();
        assert!(
            overlap.is_empty(),
            "bloc membership lists overlap: {:?}",
            overlap
        );
    }

    #[test]
    fn test_known_parties_classify() {
        assert_eq!(Bloc::from_party("PT"), Bloc::Government);
        assert_eq!(Bloc::from_party("UNIÃO"), Bloc::Government);
        assert_eq!(Bloc::from_party("PL"), Bloc::Opposition);
        assert_eq!(Bloc::from_party("NOVO"), Bloc::Opposition);
    }

    #[test]
    fn test_unlisted_party_is_independent() {
        assert_eq!(Bloc::from_party("PSDB"), Bloc::Independent);
        assert_eq!(Bloc::from_party(""), Bloc::Independent);
        // Case matters: membership is by exact party code
        assert_eq!(Bloc::from_party("pt"), Bloc::Independent);
    }
}
