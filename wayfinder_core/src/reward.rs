// wayfinder_core/src/reward.rs

use rand::Rng;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::messages::VisitorEligibility;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rarity {
    #[serde(alias = "Comum")]
    Common,
    #[serde(alias = "Raro")]
    Rare,
    #[serde(alias = "Ultra-Raro", alias = "UltraRare")]
    UltraRare,
}

impl Rarity {
    /// Accent colour used when presenting a prize of this rarity.
    pub fn accent_color(self) -> &'static str {
        match self {
            Rarity::Common => "#95a5a6",
            Rarity::Rare => "#3477db",
            Rarity::UltraRare => "#f1c40f",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            Rarity::Common => "You won!",
            Rarity::Rare => "CONGRATULATIONS!",
            Rarity::UltraRare => "INCREDIBLE!",
        }
    }
}

/// One entry of the externally owned prize catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Prize {
    pub id: u64,
    pub name: String,
    pub rarity: Rarity,
    /// Relative weight in `(0, 1]`.
    pub probability: f64,
    pub remaining_stock: u32,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Prize {
    pub fn in_stock(&self) -> bool {
        self.remaining_stock > 0
    }
}

/// Why a threshold interaction produced no prize. This is an expected outcome,
/// not a fault; the caller decides how to message it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NoEligiblePrize {
    #[error("the visitor is not registered")]
    UnknownVisitor,
    #[error("the visitor has already won a prize")]
    AlreadyWon,
    #[error("no prize has remaining stock")]
    OutOfStock,
}

impl NoEligiblePrize {
    /// The message to show the visitor. Visitors who already won are not told again.
    pub fn user_message(self) -> Option<&'static str> {
        match self {
            NoEligiblePrize::UnknownVisitor => Some("You need to register to win prizes!"),
            NoEligiblePrize::AlreadyWon => None,
            NoEligiblePrize::OutOfStock => Some("There are no more prizes available right now."),
        }
    }
}

/// The read contract of the external prize store.
pub trait RewardBackend {
    /// The visitor currently using the device, if one is registered.
    fn visitor(&self) -> Option<VisitorEligibility>;

    /// A snapshot of the prize catalog, in a stable order.
    fn catalog(&self) -> Vec<Prize>;
}

/// An in-memory snapshot, used by hosts that fetch the catalog up front.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogSnapshot {
    pub visitor: Option<VisitorEligibility>,
    pub prizes: Vec<Prize>,
}

impl RewardBackend for CatalogSnapshot {
    fn visitor(&self) -> Option<VisitorEligibility> {
        self.visitor.clone()
    }

    fn catalog(&self) -> Vec<Prize> {
        self.prizes.clone()
    }
}

/// Draws a prize with probability proportional to its weight among stocked prizes.
///
/// Draws are independent: the chosen prize is not removed from later draws, stock is
/// decremented by the external store on redemption.
#[derive(Debug, Default, Clone)]
pub struct RewardSelectionEngine;

impl RewardSelectionEngine {
    pub fn new() -> Self {
        Self
    }

    /// Runs the guards, then draws `r ~ Uniform[0, 1)` from `rng`.
    pub fn select<R: Rng + ?Sized>(
        &self,
        catalog: &[Prize],
        eligibility: Option<&VisitorEligibility>,
        rng: &mut R,
    ) -> Result<Prize, NoEligiblePrize> {
        Self::check_guards(catalog, eligibility)?;
        let r: f64 = rng.gen();
        self.select_with_draw(catalog, eligibility, r)
    }

    /// Same as [`select`](Self::select) but with the uniform draw supplied by the caller.
    pub fn select_with_draw(
        &self,
        catalog: &[Prize],
        eligibility: Option<&VisitorEligibility>,
        r: f64,
    ) -> Result<Prize, NoEligiblePrize> {
        Self::check_guards(catalog, eligibility)?;

        let stocked: Vec<&Prize> = catalog.iter().filter(|p| p.in_stock()).collect();
        let total_probability: f64 = stocked.iter().map(|p| p.probability).sum();

        let mut cumulative = 0.0;
        if total_probability > 0.0 {
            for prize in &stocked {
                cumulative += prize.probability / total_probability;
                if r <= cumulative {
                    info!("Drew prize '{}' ({:?}) with r = {:.4}", prize.name, prize.rarity, r);
                    return Ok((*prize).clone());
                }
            }
        }

        // Rounding left the cumulative sum just short of r.
        let last = stocked.last().ok_or(NoEligiblePrize::OutOfStock)?;
        debug!(
            "Cumulative weight {} never reached r = {}; falling back to '{}'",
            cumulative, r, last.name
        );
        Ok((*last).clone())
    }

    /// Pulls the visitor and catalog from `backend` and draws.
    pub fn select_from<R: Rng + ?Sized>(
        &self,
        backend: &dyn RewardBackend,
        rng: &mut R,
    ) -> Result<Prize, NoEligiblePrize> {
        let visitor = backend.visitor();
        let catalog = backend.catalog();
        self.select(&catalog, visitor.as_ref(), rng)
    }

    fn check_guards(
        catalog: &[Prize],
        eligibility: Option<&VisitorEligibility>,
    ) -> Result<(), NoEligiblePrize> {
        let visitor = eligibility.ok_or(NoEligiblePrize::UnknownVisitor)?;
        if visitor.has_won_before {
            return Err(NoEligiblePrize::AlreadyWon);
        }
        if !catalog.iter().any(Prize::in_stock) {
            return Err(NoEligiblePrize::OutOfStock);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use proptest::prelude::*;

    fn prize(id: u64, probability: f64, stock: u32) -> Prize {
        Prize {
            id,
            name: format!("prize-{id}"),
            rarity: Rarity::Common,
            probability,
            remaining_stock: stock,
            image_url: None,
            description: None,
        }
    }

    fn visitor(has_won_before: bool) -> VisitorEligibility {
        VisitorEligibility {
            id: "visitor-1".into(),
            has_won_before,
        }
    }

    fn catalog() -> Vec<Prize> {
        vec![prize(1, 0.1, 5), prize(2, 0.3, 5), prize(3, 0.6, 5)]
    }

    #[test]
    fn test_low_draw_selects_first_prize() {
        let engine = RewardSelectionEngine::new();
        let won = engine
            .select_with_draw(&catalog(), Some(&visitor(false)), 0.05)
            .unwrap();
        assert_eq!(won.id, 1);
    }

    #[test]
    fn test_high_draw_selects_last_prize() {
        let engine = RewardSelectionEngine::new();
        let won = engine
            .select_with_draw(&catalog(), Some(&visitor(false)), 0.99)
            .unwrap();
        assert_eq!(won.id, 3);
    }

    #[test]
    fn test_boundary_draw_belongs_to_lower_bucket() {
        let engine = RewardSelectionEngine::new();
        let won = engine
            .select_with_draw(&catalog(), Some(&visitor(false)), 0.1)
            .unwrap();
        assert_eq!(won.id, 1);
    }

    #[test]
    fn test_out_of_stock_prizes_are_skipped_and_weights_renormalised() {
        let engine = RewardSelectionEngine::new();
        let prizes = vec![prize(1, 0.1, 0), prize(2, 0.3, 1), prize(3, 0.1, 1)];
        // Stocked weights 0.3 and 0.1 -> buckets [0, 0.75] and (0.75, 1].
        let first = engine
            .select_with_draw(&prizes, Some(&visitor(false)), 0.7)
            .unwrap();
        assert_eq!(first.id, 2);
        let second = engine
            .select_with_draw(&prizes, Some(&visitor(false)), 0.8)
            .unwrap();
        assert_eq!(second.id, 3);
    }

    #[test]
    fn test_exhausted_walk_returns_last_stocked_prize() {
        let engine = RewardSelectionEngine::new();
        let prizes = vec![prize(1, 0.5, 1), prize(2, 0.5, 1), prize(3, 0.5, 0)];
        let won = engine
            .select_with_draw(&prizes, Some(&visitor(false)), 1.0 + 1e-9)
            .unwrap();
        assert_eq!(won.id, 2);
    }

    #[test]
    fn test_guards_run_in_order() {
        let engine = RewardSelectionEngine::new();
        let empty: Vec<Prize> = vec![prize(1, 1.0, 0)];

        assert_eq!(
            engine.select_with_draw(&empty, None, 0.5),
            Err(NoEligiblePrize::UnknownVisitor)
        );
        assert_eq!(
            engine.select_with_draw(&empty, Some(&visitor(true)), 0.5),
            Err(NoEligiblePrize::AlreadyWon)
        );
        assert_eq!(
            engine.select_with_draw(&empty, Some(&visitor(false)), 0.5),
            Err(NoEligiblePrize::OutOfStock)
        );
    }

    #[test]
    fn test_repeated_draws_do_not_consume_prizes() {
        let engine = RewardSelectionEngine::new();
        let backend = CatalogSnapshot {
            visitor: Some(visitor(false)),
            prizes: vec![prize(9, 1.0, 1)],
        };
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..5 {
            assert_eq!(engine.select_from(&backend, &mut rng).unwrap().id, 9);
        }
    }

    #[test]
    fn test_seeded_draws_follow_weights() {
        let engine = RewardSelectionEngine::new();
        let prizes = catalog();
        let eligible = visitor(false);
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut counts = [0usize; 3];
        for _ in 0..10_000 {
            let won = engine.select(&prizes, Some(&eligible), &mut rng).unwrap();
            counts[(won.id - 1) as usize] += 1;
        }
        assert!((800..1200).contains(&counts[0]), "{counts:?}");
        assert!((2700..3300).contains(&counts[1]), "{counts:?}");
        assert!((5600..6400).contains(&counts[2]), "{counts:?}");
    }

    #[test]
    fn test_user_messages() {
        assert!(NoEligiblePrize::UnknownVisitor.user_message().is_some());
        assert!(NoEligiblePrize::OutOfStock.user_message().is_some());
        assert!(NoEligiblePrize::AlreadyWon.user_message().is_none());
    }

    #[test]
    fn test_rarity_presentation() {
        assert_eq!(Rarity::UltraRare.accent_color(), "#f1c40f");
        assert_eq!(Rarity::Rare.headline(), "CONGRATULATIONS!");
    }

    proptest! {
        #[test]
        fn prop_any_draw_yields_a_stocked_catalog_prize(
            r in 0.0f64..=1.0,
            entries in prop::collection::vec((0.01f64..1.0, 0u32..3), 1..8),
        ) {
            let catalog: Vec<Prize> = entries
                .iter()
                .enumerate()
                .map(|(i, (p, stock))| prize(i as u64, *p, *stock))
                .collect();
            let engine = RewardSelectionEngine::new();
            match engine.select_with_draw(&catalog, Some(&visitor(false)), r) {
                Ok(won) => {
                    prop_assert!(won.in_stock());
                    prop_assert!(catalog.contains(&won));
                }
                Err(reason) => {
                    prop_assert_eq!(reason, NoEligiblePrize::OutOfStock);
                    prop_assert!(catalog.iter().all(|p| !p.in_stock()));
                }
            }
        }
    }
}
