//! Operation resolution between two CRSs.
//!
//! [`find_operations`] returns every operation or chain of operations that
//! transforms coordinates from a source CRS to a target CRS, filtered by the
//! [`SearchOptions`] and ranked best first.
//!
//! The search has two stages:
//! 1. Direct candidates: single operations and authored concatenated
//!    operations whose endpoints match the request in either direction.
//!    Conversions are bound to CRSs through the projected CRSs using them.
//! 2. Hub routing: when no direct candidate survives filtering, the
//!    preferred hub datums of the source and target datums are tried as a
//!    single intermediate hop.
//!
//! Resolution only reads the snapshot, so any number of calls may run
//! concurrently against the same snapshot.

mod rank;

use std::time::{Duration, Instant};

use rustc_hash::FxHashSet;
use tracing::{debug, trace, warn};

use crate::error::QueryError;
use crate::index::{endpoints, Edge};
use crate::model::{BoundingBox, ObjectKey, ObjectRef};
use crate::store::{Snapshot, Tables};
use crate::view::{CatalogObject, CrsRef, OperationRef};

pub use rank::resolve_authorities;

// =============================================================================
// OPTIONS
// =============================================================================

/// Options controlling a resolver call.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    /// Keep deprecated operations.
    pub include_deprecated: bool,
    /// Drop candidates whose area of use does not intersect this box, and
    /// prefer those overlapping it most.
    pub area_of_interest: Option<BoundingBox>,
    /// Drop candidates less accurate than this many metres.
    pub max_accuracy: Option<f64>,
    /// Authority ranking overriding every configured preference.
    pub authority_preference: Option<Vec<String>>,
    /// Drop operations superseded by another candidate.
    pub discard_superseded: bool,
    /// Stop generating candidates after this many.
    pub max_candidates: Option<usize>,
    /// Stop generating candidates after this much time.
    pub time_budget: Option<Duration>,
    /// Truncate the ranked result.
    pub max_results: Option<usize>,
}

impl Default for SearchOptions {
    fn default() -> Self {
        Self {
            include_deprecated: false,
            area_of_interest: None,
            max_accuracy: None,
            authority_preference: None,
            discard_superseded: true,
            max_candidates: None,
            time_budget: None,
            max_results: None,
        }
    }
}

impl SearchOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn include_deprecated(mut self, include: bool) -> Self {
        self.include_deprecated = include;
        self
    }

    pub fn area_of_interest(mut self, area: BoundingBox) -> Self {
        self.area_of_interest = Some(area);
        self
    }

    pub fn max_accuracy(mut self, metres: f64) -> Self {
        self.max_accuracy = Some(metres);
        self
    }

    pub fn authority_preference(mut self, authorities: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.authority_preference = Some(authorities.into_iter().map(Into::into).collect());
        self
    }

    pub fn discard_superseded(mut self, discard: bool) -> Self {
        self.discard_superseded = discard;
        self
    }

    pub fn max_candidates(mut self, max: usize) -> Self {
        self.max_candidates = Some(max);
        self
    }

    pub fn time_budget(mut self, budget: Duration) -> Self {
        self.time_budget = Some(budget);
        self
    }

    pub fn max_results(mut self, max: usize) -> Self {
        self.max_results = Some(max);
        self
    }
}

// =============================================================================
// RESULTS
// =============================================================================

/// One step of a chain, oriented in the direction of the request.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ChainStep {
    pub operation: ObjectRef,
    pub source: ObjectKey,
    pub target: ObjectKey,
    /// The operation is applied in its inverse direction.
    pub reversed: bool,
}

impl ChainStep {
    fn flipped(self) -> Self {
        ChainStep {
            operation: self.operation,
            source: self.target,
            target: self.source,
            reversed: !self.reversed,
        }
    }
}

/// How a chain was found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChainOrigin {
    /// A single authored operation.
    Direct,
    /// An authored concatenated operation.
    Concatenated,
    /// Two direct candidates joined through a CRS of a preferred hub datum.
    HubRoute {
        hub_datum: ObjectKey,
        via_crs: ObjectKey,
    },
}

/// A candidate way of going from the source CRS to the target CRS.
///
/// Steps are applied in order to go from `source` to `target`; applying the
/// inverse of each step in reverse order goes back (see
/// [`inverse`](Self::inverse)).
#[derive(Debug, Clone, PartialEq)]
pub struct OperationChain {
    pub source: ObjectKey,
    pub target: ObjectKey,
    pub origin: ChainOrigin,
    /// Authored operations the chain is made of.
    pub operations: Vec<ObjectRef>,
    pub steps: Vec<ChainStep>,
    /// Accuracy in metres, if known for every part of the chain.
    pub accuracy: Option<f64>,
    /// Area of use, intersected over the parts of the chain.
    pub area: Option<BoundingBox>,
    pub deprecated: bool,
}

impl OperationChain {
    /// The same chain for the opposite request.
    pub fn inverse(&self) -> OperationChain {
        OperationChain {
            source: self.target.clone(),
            target: self.source.clone(),
            origin: self.origin.clone(),
            operations: self.operations.clone(),
            steps: self
                .steps
                .iter()
                .rev()
                .cloned()
                .map(ChainStep::flipped)
                .collect(),
            accuracy: self.accuracy,
            area: self.area,
            deprecated: self.deprecated,
        }
    }
}

// =============================================================================
// SEARCH
// =============================================================================

/// Finds the ranked operations between two CRSs.
///
/// Unknown CRSs are an error; an empty result is not. A request whose source
/// and target are the same CRS yields no chains.
pub fn find_operations(
    snapshot: &Snapshot,
    source: &ObjectKey,
    target: &ObjectKey,
    options: &SearchOptions,
) -> Result<Vec<OperationChain>, QueryError> {
    let tables = snapshot.tables();
    let source_crs = tables
        .crs(source)
        .ok_or_else(|| QueryError::CrsNotFound(source.clone()))?;
    let target_crs = tables
        .crs(target)
        .ok_or_else(|| QueryError::CrsNotFound(target.clone()))?;
    if source == target {
        debug!(crs = %source, "identity request");
        return Ok(Vec::new());
    }

    let mut search = Search::new(snapshot, options);
    let direct = search.direct(source, target);
    let direct_count = direct.len();
    let mut candidates = search.filter(direct);
    debug!(
        %source,
        %target,
        direct = direct_count,
        kept = candidates.len(),
        "direct candidates"
    );

    if candidates.is_empty() && !search.exhausted {
        let routed = search.via_hubs(source_crs, target_crs);
        let routed_count = routed.len();
        candidates = search.filter(routed);
        debug!(
            %source,
            %target,
            routed = routed_count,
            kept = candidates.len(),
            "hub candidates"
        );
    }

    let authorities = resolve_authorities(snapshot, source, target, options);
    rank::sort(&mut candidates, authorities, options.area_of_interest.as_ref());
    if let Some(max) = options.max_results {
        candidates.truncate(max);
    }
    Ok(candidates)
}

struct Search<'a> {
    snapshot: &'a Snapshot,
    options: &'a SearchOptions,
    max_candidates: Option<usize>,
    started: Instant,
    generated: usize,
    exhausted: bool,
}

impl<'a> Search<'a> {
    fn new(snapshot: &'a Snapshot, options: &'a SearchOptions) -> Self {
        Self {
            snapshot,
            options,
            max_candidates: options
                .max_candidates
                .or(snapshot.config().resolver.max_candidates),
            started: Instant::now(),
            generated: 0,
            exhausted: false,
        }
    }

    fn tables(&self) -> &'a Tables {
        self.snapshot.tables()
    }

    /// Returns false once the candidate or time budget is spent.
    fn budget_left(&mut self) -> bool {
        if self.exhausted {
            return false;
        }
        let over_count = self.max_candidates.is_some_and(|max| self.generated >= max);
        let over_time = self
            .options
            .time_budget
            .is_some_and(|budget| self.started.elapsed() >= budget);
        if over_count || over_time {
            self.exhausted = true;
            warn!(
                generated = self.generated,
                over_count, over_time, "resolver budget exhausted, returning partial result"
            );
        }
        !self.exhausted
    }

    /// Single operations and concatenated operations between two CRSs.
    fn direct(&mut self, from: &ObjectKey, to: &ObjectKey) -> Vec<OperationChain> {
        let mut out = Vec::new();
        for edge in self.snapshot.indices().edges_of(from) {
            let reversed = if edge.source == *from && edge.target == *to {
                false
            } else if edge.source == *to && edge.target == *from {
                true
            } else {
                continue;
            };
            if !self.budget_left() {
                break;
            }
            if let Some(chain) = self.edge_chain(edge, reversed) {
                self.generated += 1;
                out.push(chain);
            }
        }
        out
    }

    fn edge_chain(&self, edge: &Edge, reversed: bool) -> Option<OperationChain> {
        let tables = self.tables();
        let op = tables.operation(&edge.operation.key)?;
        let (origin, mut steps, deprecated, accuracy) = match op {
            OperationRef::Concatenated(concat) => {
                let steps = self.expand_concatenated(&concat.source_crs, &concat.steps)?;
                let step_deprecated = steps.iter().any(|s| {
                    tables
                        .operation(&s.operation.key)
                        .is_some_and(|o| o.deprecated())
                });
                let accuracy = concat.accuracy.or_else(|| {
                    steps.iter().try_fold(0.0, |sum, s| {
                        Some(sum + tables.operation(&s.operation.key)?.accuracy()?)
                    })
                });
                (
                    ChainOrigin::Concatenated,
                    steps,
                    concat.deprecated || step_deprecated,
                    accuracy,
                )
            }
            _ => (
                ChainOrigin::Direct,
                vec![ChainStep {
                    operation: edge.operation.clone(),
                    source: edge.source.clone(),
                    target: edge.target.clone(),
                    reversed: false,
                }],
                op.deprecated(),
                op.accuracy(),
            ),
        };
        if reversed {
            steps = steps.into_iter().rev().map(ChainStep::flipped).collect();
        }
        let (source, target) = if reversed {
            (edge.target.clone(), edge.source.clone())
        } else {
            (edge.source.clone(), edge.target.clone())
        };
        Some(OperationChain {
            source,
            target,
            origin,
            operations: vec![edge.operation.clone()],
            steps,
            accuracy,
            area: op
                .area()
                .and_then(|a| tables.extents.get(a))
                .map(|e| e.bbox),
            deprecated,
        })
    }

    /// Orients the steps of a concatenated operation starting at `start`.
    ///
    /// Concatenated operations match requests in both directions: the
    /// expansion always starts at the operation's own source CRS, and
    /// [`Self::edge_chain`] walks the steps backwards for the opposite request.
    ///
    /// A step whose endpoints cannot be determined (a conversion no
    /// projected CRS uses) keeps the current position as both endpoints.
    fn expand_concatenated(&self, start: &ObjectKey, keys: &[ObjectKey]) -> Option<Vec<ChainStep>> {
        let tables = self.tables();
        let indices = self.snapshot.indices();
        let mut cursor = start.clone();
        let mut steps = Vec::with_capacity(keys.len());
        for key in keys {
            let op = tables.operation(key)?;
            let operation = ObjectRef::new(op.kind(), key.clone());
            let step = match endpoints(&op, indices) {
                Some((s, t)) if *t == cursor && *s != cursor => ChainStep {
                    operation,
                    source: t.clone(),
                    target: s.clone(),
                    reversed: true,
                },
                Some((s, t)) => ChainStep {
                    operation,
                    source: s.clone(),
                    target: t.clone(),
                    reversed: false,
                },
                None => ChainStep {
                    operation,
                    source: cursor.clone(),
                    target: cursor.clone(),
                    reversed: false,
                },
            };
            cursor = step.target.clone();
            steps.push(step);
        }
        Some(steps)
    }

    /// Two-leg chains through CRSs of the preferred hub datums.
    ///
    /// Only called when no direct candidate survived filtering, so a request
    /// whose direct operations are all filtered out (deprecated, outside the
    /// area of interest, too inaccurate) still gets hub routes.
    fn via_hubs(&mut self, source: CrsRef<'a>, target: CrsRef<'a>) -> Vec<OperationChain> {
        let tables = self.tables();
        let indices = self.snapshot.indices();
        let (Some(source_datum), Some(target_datum)) =
            (datum_of(tables, source), datum_of(tables, target))
        else {
            return Vec::new();
        };

        let mut visited: FxHashSet<&ObjectKey> = FxHashSet::default();
        visited.insert(source_datum);
        visited.insert(target_datum);

        let mut out = Vec::new();
        let hubs = indices
            .hubs_of(source_datum)
            .iter()
            .chain(indices.hubs_of(target_datum));
        for hub in hubs {
            if !visited.insert(hub) {
                trace!(%hub, "hub already on path");
                continue;
            }
            for via in indices.crs_of_datum(hub) {
                if via == source.key() || via == target.key() || !self.budget_left() {
                    continue;
                }
                trace!(%hub, %via, "trying hub route");
                let first = self.direct(source.key(), via);
                if first.is_empty() {
                    continue;
                }
                let second = self.direct(via, target.key());
                for a in &first {
                    for b in &second {
                        if let Some(chain) = join(a, b, hub, via) {
                            out.push(chain);
                        }
                    }
                }
            }
        }
        out
    }

    fn filter(&self, mut chains: Vec<OperationChain>) -> Vec<OperationChain> {
        let options = self.options;
        if !options.include_deprecated {
            chains.retain(|c| !c.deprecated);
        }
        if let Some(aoi) = &options.area_of_interest {
            chains.retain(|c| c.area.is_none_or(|area| area.intersects(aoi)));
        }
        if let Some(max) = options.max_accuracy {
            chains.retain(|c| c.accuracy.is_none_or(|a| a <= max));
        }
        if options.discard_superseded {
            let indices = self.snapshot.indices();
            let present: FxHashSet<&ObjectRef> =
                chains.iter().flat_map(|c| c.operations.iter()).collect();
            // A replacement only displaces an operation it does not lead back to.
            let superseded: Vec<bool> = chains
                .iter()
                .map(|c| {
                    c.operations.iter().any(|op| {
                        indices.same_pair_supersessors_of(op).iter().any(|r| {
                            r != op
                                && present.contains(r)
                                && !indices.supersession_closure(r).contains(op)
                        })
                    })
                })
                .collect();
            let mut flags = superseded.into_iter();
            chains.retain(|_| !flags.next().unwrap_or(false));
        }
        chains
    }
}

/// Datum a CRS is anchored to, if it is geodetic-datum based.
fn datum_of<'a>(tables: &'a Tables, crs: CrsRef<'a>) -> Option<&'a ObjectKey> {
    match crs {
        CrsRef::Geodetic(c) => c.datum.as_ref(),
        CrsRef::Projected(c) => tables.geodetic_crs.get(c.geodetic_crs.as_ref()?)?.datum.as_ref(),
        CrsRef::Compound(c) => match tables.crs(&c.horizontal_crs)? {
            CrsRef::Compound(_) => None,
            horizontal => datum_of(tables, horizontal),
        },
        CrsRef::Vertical(_) => None,
    }
}

/// Joins two legs meeting at `via`. Legs whose areas do not intersect
/// cannot be combined.
fn join(
    first: &OperationChain,
    second: &OperationChain,
    hub: &ObjectKey,
    via: &ObjectKey,
) -> Option<OperationChain> {
    let area = match (first.area, second.area) {
        (Some(a), Some(b)) => Some(a.intersection(&b)?),
        (a, b) => a.or(b),
    };
    let accuracy = match (first.accuracy, second.accuracy) {
        (Some(a), Some(b)) => Some(a + b),
        _ => None,
    };
    Some(OperationChain {
        source: first.source.clone(),
        target: second.target.clone(),
        origin: ChainOrigin::HubRoute {
            hub_datum: hub.clone(),
            via_crs: via.clone(),
        },
        operations: first
            .operations
            .iter()
            .chain(&second.operations)
            .cloned()
            .collect(),
        steps: first.steps.iter().chain(&second.steps).cloned().collect(),
        accuracy,
        area,
        deprecated: first.deprecated || second.deprecated,
    })
}
