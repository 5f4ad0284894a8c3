// Category Screen - tag decoded trials and drop unknown / repeated categories
//
// Runs between decoding and index resolution. No-op without a category table.

use crate::types::Trial;
use marc_common::{CategoryTable, TrialCategory};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Tag each trial with its category, keeping the first trial per category
///
/// Trials whose label set matches no category are dropped. Later trials for
/// an already-seen category are dropped as duplicates.
pub fn screen_trials(
    participant_id: &str,
    trials: Vec<Trial>,
    table: &CategoryTable,
) -> Vec<Trial> {
    if table.is_empty() {
        return trials;
    }

    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(trials.len());

    for mut trial in trials {
        let category = table.classify(&trial.item_order);
        let Some(tag) = category.tag().map(str::to_string) else {
            warn!(
                "Participant {}: trial {} with {} items matches no category; dropping",
                participant_id,
                trial.context,
                trial.item_count()
            );
            continue;
        };

        if let Some(hint) = &trial.category {
            if hint != &tag && category != TrialCategory::Full {
                debug!(
                    "Participant {}: trial {} labelled '{}' but contains '{}' items",
                    participant_id, trial.context, hint, tag
                );
            }
        }

        if !seen.insert(tag.clone()) {
            warn!(
                "Participant {}: duplicate '{}' trial {} dropped",
                participant_id, tag, trial.context
            );
            continue;
        }

        trial.category = Some(tag);
        kept.push(trial);
    }

    kept
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    fn table() -> CategoryTable {
        let mut groups = BTreeMap::new();
        groups.insert("animals".to_string(), vec!["cat".to_string(), "dog".to_string()]);
        groups.insert("tools".to_string(), vec!["saw".to_string(), "axe".to_string()]);
        CategoryTable::from_groups(&groups).unwrap()
    }

    fn trial(labels: &[&str], context: &str) -> Trial {
        let n = labels.len();
        Trial {
            item_order: labels.iter().map(|s| s.to_string()).collect(),
            pairwise_distances: vec![0.5; n * (n - 1) / 2],
            category: None,
            context: context.to_string(),
        }
    }

    #[test]
    fn test_no_table_keeps_everything() {
        let trials = vec![trial(&["cat", "dog"], "r1"), trial(&["cat", "dog"], "r2")];
        let kept = screen_trials("p1", trials.clone(), &CategoryTable::default());
        assert_eq!(kept, trials);
    }

    #[test]
    fn test_tags_and_drops_duplicates_keeping_first() {
        let trials = vec![
            trial(&["saw", "cat", "dog", "axe"], "r1"),
            trial(&["dog", "cat"], "r2"),
            trial(&["cat", "dog"], "r3"),
            trial(&["axe", "saw"], "r4"),
        ];
        let kept = screen_trials("p1", trials, &table());

        let contexts: Vec<_> = kept.iter().map(|t| t.context.as_str()).collect();
        assert_eq!(contexts, vec!["r1", "r2", "r4"]);
        assert_eq!(kept[0].category.as_deref(), Some("all_items"));
        assert_eq!(kept[1].category.as_deref(), Some("animals"));
        assert_eq!(kept[2].category.as_deref(), Some("tools"));
    }

    #[test]
    fn test_unknown_trial_dropped() {
        let trials = vec![trial(&["cat", "saw"], "r1")];
        assert!(screen_trials("p1", trials, &table()).is_empty());
    }
}
