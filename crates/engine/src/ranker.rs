//! Turn resolved (address, score) entries into a strictly ordered,
//! rank-labeled leaderboard.

use common::types::{Address, LeaderboardEntry, Score};

/// Display treatment for a rank: a medal for the podium, a 1-based numeric
/// label for everyone else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Medal {
    Gold,
    Silver,
    Bronze,
    Rank(usize),
}

impl Medal {
    pub fn for_rank(rank: usize) -> Self {
        match rank {
            0 => Self::Gold,
            1 => Self::Silver,
            2 => Self::Bronze,
            n => Self::Rank(n),
        }
    }

    pub fn label(&self) -> String {
        match self {
            Self::Gold => "gold".to_string(),
            Self::Silver => "silver".to_string(),
            Self::Bronze => "bronze".to_string(),
            Self::Rank(n) => (n + 1).to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedEntry {
    /// 0-based rank.
    pub rank: usize,
    pub medal: Medal,
    pub address: Address,
    pub score: Score,
}

/// Stable sort by score descending. `Decimal` comparison, so the large
/// integers of the chain path and the fractional model scores rank without
/// precision loss; ties keep the resolver's first-seen order.
pub fn rank(mut entries: Vec<LeaderboardEntry>) -> Vec<RankedEntry> {
    entries.sort_by(|a, b| b.score.cmp(&a.score));
    entries
        .into_iter()
        .enumerate()
        .map(|(rank, entry)| RankedEntry {
            rank,
            medal: Medal::for_rank(rank),
            address: entry.address,
            score: entry.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use std::collections::HashSet;

    fn addr(n: u8) -> Address {
        format!("0x{:040x}", u128::from(n)).parse().unwrap()
    }

    fn entry(n: u8, score: i64) -> LeaderboardEntry {
        LeaderboardEntry {
            address: addr(n),
            score: Decimal::from(score),
        }
    }

    #[test]
    fn test_rank_sorts_descending() {
        let ranked = rank(vec![entry(1, 10), entry(2, 99), entry(3, 50)]);
        for pair in ranked.windows(2) {
            assert!(pair[0].score >= pair[1].score);
        }
        assert_eq!(ranked[0].address, addr(2));
    }

    #[test]
    fn test_rank_preserves_address_set() {
        let entries = vec![entry(1, 5), entry(2, 5), entry(3, 7)];
        let before: HashSet<Address> = entries.iter().map(|e| e.address.clone()).collect();
        let ranked = rank(entries);
        let after: HashSet<Address> = ranked.iter().map(|e| e.address.clone()).collect();
        assert_eq!(before, after);
        assert_eq!(ranked.len(), 3);
    }

    #[test]
    fn test_rank_is_stable_for_ties() {
        let ranked = rank(vec![entry(1, 42), entry(2, 42), entry(3, 42)]);
        assert_eq!(ranked[0].address, addr(1));
        assert_eq!(ranked[1].address, addr(2));
        assert_eq!(ranked[2].address, addr(3));
    }

    #[test]
    fn test_medal_mapping() {
        assert_eq!(Medal::for_rank(0), Medal::Gold);
        assert_eq!(Medal::for_rank(1), Medal::Silver);
        assert_eq!(Medal::for_rank(2), Medal::Bronze);
        assert_eq!(Medal::for_rank(3), Medal::Rank(3));
        assert_eq!(Medal::for_rank(3).label(), "4");
        assert_eq!(Medal::for_rank(9).label(), "10");
    }

    #[test]
    fn test_rank_empty_input() {
        assert!(rank(Vec::new()).is_empty());
    }

    #[test]
    fn test_rank_scenario_two_helpers() {
        // Distinct helpers {A, C} with scores {A: 80, C: 60}.
        let ranked = rank(vec![entry(1, 80), entry(3, 60)]);
        assert_eq!(ranked.len(), 2);
        assert_eq!(
            (ranked[0].rank, ranked[0].address.clone(), ranked[0].score),
            (0, addr(1), Decimal::from(80))
        );
        assert_eq!(
            (ranked[1].rank, ranked[1].address.clone(), ranked[1].score),
            (1, addr(3), Decimal::from(60))
        );
        assert_eq!(ranked[0].medal, Medal::Gold);
        assert_eq!(ranked[1].medal, Medal::Silver);
    }

    #[test]
    fn test_rank_large_chain_scores_beat_small_without_precision_loss() {
        // 2^64 + 1 vs 2^64: indistinguishable in f64, distinct in Decimal.
        let big: Decimal = "18446744073709551617".parse().unwrap();
        let small: Decimal = "18446744073709551616".parse().unwrap();
        let ranked = rank(vec![
            LeaderboardEntry {
                address: addr(1),
                score: small,
            },
            LeaderboardEntry {
                address: addr(2),
                score: big,
            },
        ]);
        assert_eq!(ranked[0].address, addr(2));
    }
}
