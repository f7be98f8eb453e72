//! Cheap change detection over aggregate snapshots, used only to skip
//! redundant chart work. Correctness never depends on it.

use serde::Serialize;

use crate::model::BalanceSnapshot;

/// True when the fresh snapshot differs meaningfully from the last rendered
/// one: missing prior snapshot, changed global stats, or any order-sensitive
/// difference in the token or chain summaries.
pub fn has_changed(old: Option<&BalanceSnapshot>, new: &BalanceSnapshot) -> bool {
    let Some(old) = old else {
        return true;
    };

    if old.global_stats.total_accounts != new.global_stats.total_accounts
        || old.global_stats.total_usd_value != new.global_stats.total_usd_value
    {
        return true;
    }

    serialized(&old.top_tokens) != serialized(&new.top_tokens)
        || serialized(&old.chains) != serialized(&new.chains)
}

fn serialized<T: Serialize>(value: &T) -> String {
    // plain data structs, serialization cannot fail
    serde_json::to_string(value).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChainSummary, GlobalStats, TokenSummary};

    fn snapshot() -> BalanceSnapshot {
        BalanceSnapshot {
            global_stats: GlobalStats {
                total_accounts: 3,
                total_usd_value: 1500.0,
            },
            top_tokens: vec![TokenSummary {
                symbol: "ETH".to_string(),
                value: 1000.0,
            }],
            chains: vec![ChainSummary {
                name: "eth".to_string(),
                total_value: 1500.0,
            }],
        }
    }

    #[test]
    fn absent_old_snapshot_counts_as_changed() {
        assert!(has_changed(None, &snapshot()));
    }

    #[test]
    fn identical_snapshots_are_unchanged() {
        let old = snapshot();
        let new = snapshot();
        assert!(!has_changed(Some(&old), &new));
    }

    #[test]
    fn global_stats_differences_are_detected() {
        let old = snapshot();
        let mut new = snapshot();
        new.global_stats.total_usd_value += 0.01;
        assert!(has_changed(Some(&old), &new));

        let mut new = snapshot();
        new.global_stats.total_accounts += 1;
        assert!(has_changed(Some(&old), &new));
    }

    #[test]
    fn token_order_is_significant() {
        let mut old = snapshot();
        old.top_tokens.push(TokenSummary {
            symbol: "BTC".to_string(),
            value: 500.0,
        });
        let mut new = old.clone();
        new.top_tokens.reverse();
        assert!(has_changed(Some(&old), &new));
    }

    #[test]
    fn chain_value_changes_are_detected() {
        let old = snapshot();
        let mut new = snapshot();
        new.chains[0].total_value = 1400.0;
        assert!(has_changed(Some(&old), &new));
    }
}
