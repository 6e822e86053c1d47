//! Property-based tests for dataset invariants.

use annostore::{create_subsets, Dataset, EntityId};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::BTreeSet;

fn unit_with(n: usize) -> (Dataset, EntityId, Vec<EntityId>) {
    let mut ds = Dataset::new("sentence");
    let unit = ds.add_textual_unit();
    let mut tokens = Vec::with_capacity(n);
    for i in 0..n {
        let id = match tokens.last() {
            Some(&previous) => ds.add_token_after(previous, format!("w{i}"), i * 3).unwrap(),
            None => ds.add_first_token(unit, "w0", 0).unwrap(),
        };
        tokens.push(id);
    }
    (ds, unit, tokens)
}

fn orders_are_positions(ds: &Dataset, unit: EntityId) -> bool {
    ds.tokens_of(unit)
        .unwrap()
        .iter()
        .enumerate()
        .all(|(i, &t)| ds.token(t).unwrap().order() == i && ds.token_by_order(unit, i).unwrap() == Some(t))
}

proptest! {
    #[test]
    fn span_add_succeeds_iff_adjacent(
        n in 2usize..12,
        start in 0usize..12,
        len in 1usize..4,
        candidate in 0usize..12,
    ) {
        let (mut ds, _, tokens) = unit_with(n);
        let start = start % n;
        let end = (start + len - 1).min(n - 1);
        let candidate = candidate % n;
        let span = ds.add_span("probe", tokens[start], tokens[end]).unwrap();
        let before: Vec<_> = ds.tokens_of(span).unwrap();

        let adjacent = candidate + 1 == start || candidate == end + 1;
        let result = ds.span_add_token(span, tokens[candidate]);

        prop_assert_eq!(result.is_ok(), adjacent);
        if !adjacent {
            prop_assert_eq!(ds.tokens_of(span).unwrap(), before);
        }
    }

    #[test]
    fn orders_stay_positional_under_edits(
        n in 3usize..10,
        inserts in prop::collection::vec(0usize..10, 0..4),
        removals in prop::collection::vec(0usize..10, 0..3),
    ) {
        let (mut ds, unit, _) = unit_with(n);
        for at in inserts {
            let tokens = ds.tokens_of(unit).unwrap();
            let after = tokens[at % tokens.len()];
            ds.add_token_after(after, "new", 0).unwrap();
        }
        for at in removals {
            let tokens = ds.tokens_of(unit).unwrap();
            if tokens.len() > 1 {
                ds.remove(tokens[at % tokens.len()]).unwrap();
            }
        }
        prop_assert!(orders_are_positions(&ds, unit));
    }

    #[test]
    fn merge_tokens_keeps_orders_positional(n in 3usize..10, first in 0usize..10, width in 1usize..4) {
        let (mut ds, unit, tokens) = unit_with(n);
        let first = first % n;
        let last = (first + width).min(n - 1);
        let whole = ds.add_span("whole", tokens[0], tokens[n - 1]).unwrap();
        ds.merge_tokens(tokens[first], tokens[last], "merged").unwrap();

        prop_assert!(orders_are_positions(&ds, unit));
        prop_assert_eq!(ds.span(unit).unwrap().len(), n - (last - first));
        prop_assert_eq!(ds.tokens_of(whole).unwrap(), ds.tokens_of(unit).unwrap());
    }

    #[test]
    fn partition_sizes_track_proportions(
        n in 1usize..300,
        weights in prop::collection::vec(1u32..10, 1..5),
        seed in any::<u64>(),
    ) {
        let total: u32 = weights.iter().sum();
        let proportions: Vec<f64> = weights.iter().map(|&w| f64::from(w) / f64::from(total)).collect();
        let spans: BTreeSet<EntityId> = (1..=n as u64).collect();
        let mut rng = StdRng::seed_from_u64(seed);

        let subsets = create_subsets(&spans, &proportions, true, &mut rng).unwrap();
        prop_assert_eq!(subsets.iter().map(BTreeSet::len).sum::<usize>(), n);
        for (i, subset) in subsets.iter().enumerate() {
            let floor = (n as f64 * proportions[i] + 1e-9).floor() as usize;
            if i + 1 < subsets.len() {
                prop_assert_eq!(subset.len(), floor);
            } else {
                prop_assert!(subset.len() >= floor);
            }
        }
    }
}
