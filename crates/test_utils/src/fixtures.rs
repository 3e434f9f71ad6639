//! Pre-built test data for common entities

use fake::faker::lorem::en::Sentence;
use fake::Fake;
use once_cell::sync::Lazy;

use core_kernel::{Currency, Money, PartyId};
use domain_claims::claim::{Actor, ActorRole};

/// Diagnoses that show up across the suite
pub static DIAGNOSES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "Flu",
        "Knee Surgery",
        "Fracture",
        "Migraine",
        "Asthma",
        "Hypertension",
        "Appendicitis",
    ]
});

/// Money fixtures
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// A routine consultation amount
    pub fn consultation() -> Money {
        Money::from_minor(15_000, Currency::USD)
    }

    /// A surgical claim amount
    pub fn surgery() -> Money {
        Money::from_minor(250_000, Currency::USD)
    }

    /// USD from whole units
    pub fn usd(units: i64) -> Money {
        Money::from_minor(units * 100, Currency::USD)
    }
}

/// Identifier fixtures
pub struct IdFixtures;

impl IdFixtures {
    pub fn claimant() -> PartyId {
        PartyId::new_v7()
    }

    pub fn provider() -> PartyId {
        PartyId::new_v7()
    }
}

/// Free-text fixtures
pub struct StringFixtures;

impl StringFixtures {
    /// A deterministic diagnosis
    pub fn diagnosis() -> &'static str {
        DIAGNOSES[0]
    }

    /// A random-but-plausible treatment description
    pub fn treatment() -> String {
        Sentence(3..8).fake()
    }

    /// A random encounter description
    pub fn description() -> String {
        Sentence(5..12).fake()
    }

    /// A plausible content hash for a supporting document
    pub fn document_hash() -> &'static str {
        "QmYwAPJzv5CZsnAzt8auVZRn1pfejgTQuzNXEYheDhqzNM"
    }
}

/// Actor fixtures, one per role
pub struct ActorFixtures;

impl ActorFixtures {
    pub fn member() -> Actor {
        Actor::new("member-1", ActorRole::Member)
    }

    pub fn approver() -> Actor {
        Actor::new("approver-1", ActorRole::Approver)
    }

    pub fn admin() -> Actor {
        Actor::new("admin-1", ActorRole::Admin)
    }

    pub fn auditor() -> Actor {
        Actor::new("auditor-1", ActorRole::Auditor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixture_amounts_are_positive() {
        assert!(MoneyFixtures::consultation().is_positive());
        assert!(MoneyFixtures::surgery().is_positive());
        assert!(MoneyFixtures::usd(1).is_positive());
    }

    #[test]
    fn test_generated_text_is_non_empty() {
        assert!(!StringFixtures::treatment().trim().is_empty());
        assert!(!StringFixtures::description().trim().is_empty());
    }
}
