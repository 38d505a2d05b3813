//! Collector hooks: unreachable ranges and per-node type maps.
//!
//! Purely observational. The evaluator records the type of every
//! expression node it evaluates, bucketed by which function body and
//! which case run produced the observation, so editor queries can select
//! the active case per function. Unreachable spans accumulate globally
//! per analysis.

use rustc_hash::FxHashMap;

use jsty_ast::NodeIndex;
use jsty_common::Span;
use jsty_solver::types::TypeValue;

/// Which evaluation pass an observation belongs to: the body of a
/// function under a specific case run, or top-level code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CollectKey {
    /// Function node, or `NodeIndex::NONE` for top-level evaluation.
    pub function: NodeIndex,
    pub case_index: usize,
}

impl CollectKey {
    pub const TOP_LEVEL: CollectKey = CollectKey {
        function: NodeIndex::NONE,
        case_index: 0,
    };

    pub fn case(function: NodeIndex, case_index: usize) -> CollectKey {
        CollectKey {
            function,
            case_index,
        }
    }
}

#[derive(Debug, Default)]
pub struct Collector {
    node_types: FxHashMap<CollectKey, Vec<(Span, TypeValue)>>,
    unreachable: Vec<Span>,
}

impl Collector {
    pub fn reset(&mut self) {
        self.node_types.clear();
        self.unreachable.clear();
    }

    pub fn record_type(&mut self, key: CollectKey, span: Span, ty: TypeValue) {
        if span.is_dummy() {
            return;
        }
        self.node_types.entry(key).or_default().push((span, ty));
    }

    pub fn record_unreachable(&mut self, span: Span) {
        if span.is_dummy() {
            return;
        }
        // Collapse adjacent reports of the same region.
        if self.unreachable.last() != Some(&span) {
            self.unreachable.push(span);
        }
    }

    pub fn unreachable_spans(&self) -> &[Span] {
        &self.unreachable
    }

    /// The narrowest recorded span containing `offset`, searching the
    /// given buckets in order. Later observations of the same span win
    /// (they reflect the latest evaluation state).
    pub fn type_at(
        &self,
        offset: u32,
        keys: impl IntoIterator<Item = CollectKey>,
    ) -> Option<TypeValue> {
        let mut best: Option<(Span, &TypeValue)> = None;
        for key in keys {
            let Some(entries) = self.node_types.get(&key) else {
                continue;
            };
            for (span, ty) in entries {
                if !span.contains(offset) {
                    continue;
                }
                let narrower = match best {
                    None => true,
                    Some((best_span, _)) => {
                        span.len() < best_span.len()
                            || (span.len() == best_span.len() && best_span == *span)
                    }
                };
                if narrower {
                    best = Some((*span, ty));
                }
            }
        }
        best.map(|(_, ty)| ty.clone())
    }

    /// All case buckets recorded for a function node.
    pub fn case_indices(&self, function: NodeIndex) -> Vec<usize> {
        let mut indices: Vec<usize> = self
            .node_types
            .keys()
            .filter(|key| key.function == function)
            .map(|key| key.case_index)
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
    }

    /// Function nodes with at least one recorded observation.
    pub fn recorded_functions(&self) -> Vec<NodeIndex> {
        let mut nodes: Vec<NodeIndex> = self
            .node_types
            .keys()
            .map(|key| key.function)
            .filter(|node| !node.is_none())
            .collect();
        nodes.sort_by_key(|node| node.0);
        nodes.dedup();
        nodes
    }
}
