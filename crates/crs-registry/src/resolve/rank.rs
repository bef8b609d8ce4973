//! Ordering of resolver candidates.

use std::cmp::Ordering;

use crate::model::{find_preference, BoundingBox, ObjectKey};
use crate::resolve::{OperationChain, SearchOptions};
use crate::store::Snapshot;

/// Authorities whose operations are preferred for a request, best first.
///
/// The first of these wins: the per-call override, the preferences stored in
/// the snapshot, the configured preferences, the configured default list.
pub fn resolve_authorities<'a>(
    snapshot: &'a Snapshot,
    source: &ObjectKey,
    target: &ObjectKey,
    options: &'a SearchOptions,
) -> &'a [String] {
    if let Some(list) = &options.authority_preference {
        return list;
    }
    let (s, t) = (source.authority.as_str(), target.authority.as_str());
    let config = &snapshot.config().resolver;
    find_preference(&snapshot.tables().authority_preferences, s, t)
        .or_else(|| config.preference_for(s, t))
        .unwrap_or(&config.default_authorities)
}

/// Position of the worst-ranked authority used by the chain. Authorities
/// missing from the list rank after every listed one.
fn authority_rank(chain: &OperationChain, authorities: &[String]) -> usize {
    chain
        .operations
        .iter()
        .map(|op| {
            authorities
                .iter()
                .position(|a| *a == op.key.authority)
                .unwrap_or(authorities.len())
        })
        .max()
        .unwrap_or(authorities.len())
}

/// Known accuracies first, smallest first.
fn cmp_accuracy(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.total_cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn overlap(chain: &OperationChain, aoi: Option<&BoundingBox>) -> f64 {
    match (aoi, &chain.area) {
        (Some(aoi), Some(area)) => area.overlap_area(aoi),
        _ => 0.0,
    }
}

/// Keys of the operations in a chain, compared by (authority, code) whatever
/// their kind.
fn operation_keys(chain: &OperationChain) -> impl Iterator<Item = &ObjectKey> {
    chain.operations.iter().map(|o| &o.key)
}

/// Sorts candidates best first. The order is total, so equal inputs always
/// produce the same output.
pub(crate) fn sort(chains: &mut [OperationChain], authorities: &[String], aoi: Option<&BoundingBox>) {
    chains.sort_by(|a, b| {
        authority_rank(a, authorities)
            .cmp(&authority_rank(b, authorities))
            .then_with(|| cmp_accuracy(a.accuracy, b.accuracy))
            .then_with(|| overlap(b, aoi).total_cmp(&overlap(a, aoi)))
            .then_with(|| a.deprecated.cmp(&b.deprecated))
            .then_with(|| operation_keys(a).cmp(operation_keys(b)))
            .then_with(|| a.steps.cmp(&b.steps))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Kind, ObjectRef};
    use crate::resolve::ChainOrigin;

    fn chain(code: &str, authority: &str, accuracy: Option<f64>) -> OperationChain {
        let key = ObjectKey::new(authority, code);
        OperationChain {
            source: ObjectKey::new("EPSG", "1"),
            target: ObjectKey::new("EPSG", "2"),
            origin: ChainOrigin::Direct,
            operations: vec![ObjectRef::new(Kind::HelmertTransformation, key)],
            steps: Vec::new(),
            accuracy,
            area: None,
            deprecated: false,
        }
    }

    #[test]
    fn test_key_tie_break_ignores_kind() {
        let mut other = chain("0999", "EPSG", Some(1.0));
        other.operations[0].kind = Kind::OtherTransformation;
        let mut chains = vec![chain("1000", "EPSG", Some(1.0)), other];
        sort(&mut chains, &["EPSG".to_string()], None);
        assert_eq!(codes(&chains), vec!["0999", "1000"]);
    }

    fn codes(chains: &[OperationChain]) -> Vec<&str> {
        chains.iter().map(|c| c.operations[0].key.code.as_str()).collect()
    }

    #[test]
    fn test_accuracy_ordering() {
        let mut chains = vec![
            chain("c", "EPSG", None),
            chain("b", "EPSG", Some(5.0)),
            chain("a", "EPSG", Some(1.0)),
        ];
        sort(&mut chains, &["EPSG".to_string()], None);
        assert_eq!(codes(&chains), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_authority_beats_accuracy() {
        let mut chains = vec![
            chain("a", "OTHER", Some(0.1)),
            chain("b", "PROJ", Some(2.0)),
            chain("c", "EPSG", Some(3.0)),
        ];
        sort(&mut chains, &["EPSG".to_string(), "PROJ".to_string()], None);
        assert_eq!(codes(&chains), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_overlap_breaks_ties() {
        let aoi = BoundingBox::new(0.0, 10.0, 0.0, 10.0);
        let mut small = chain("a", "EPSG", Some(1.0));
        small.area = Some(BoundingBox::new(0.0, 1.0, 0.0, 1.0));
        let mut large = chain("b", "EPSG", Some(1.0));
        large.area = Some(BoundingBox::new(0.0, 10.0, 0.0, 10.0));
        let mut chains = vec![small, large];
        sort(&mut chains, &["EPSG".to_string()], Some(&aoi));
        assert_eq!(codes(&chains), vec!["b", "a"]);
    }

    #[test]
    fn test_deprecated_last_then_key() {
        let mut old = chain("a", "EPSG", Some(1.0));
        old.deprecated = true;
        let mut chains = vec![old, chain("c", "EPSG", Some(1.0)), chain("b", "EPSG", Some(1.0))];
        sort(&mut chains, &["EPSG".to_string()], None);
        assert_eq!(codes(&chains), vec!["b", "c", "a"]);
    }
}
