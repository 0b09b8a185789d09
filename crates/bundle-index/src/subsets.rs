//! Critical set enumeration.
//!
//! # Overview
//!
//! A critical set of a vertex `v` is a set of at most `k` other vertices, each
//! adjacent to `v` in the configured [`Direction`]. The empty set is always a
//! critical set.
//!
//! # Algorithm
//!
//! Binary include/skip recursion over the candidate list:
//!
//! ```text
//! step(i, S):
//!     if i == n: stop
//!     if |S| < k:
//!         S' = S ∪ {c_i}     -- fresh subset, test and maybe emit
//!         step(i + 1, S')
//!     step(i + 1, S)         -- skip c_i
//! ```
//!
//! Only the root and the include step create a new subset, so every distinct
//! subset is tested exactly once and no deduplication is needed. A subset is
//! emitted when all of its members pass the adjacency predicate. Including a
//! non-adjacent candidate can never lead to an emission, so that branch is not
//! descended.
//!
//! The recursion is as deep as the candidate list is long.
//! [`SubsetGenerator::visit_iterative`] walks the same tree in the same order
//! with an explicit work stack, and [`Enumeration::Auto`] switches to it above
//! [`RECURSION_LIMIT`] candidates.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::ControlFlow;
use std::str::FromStr;

use bundle_core::graph::{Direction, WeightedGraph};
use serde::{Deserialize, Serialize};

/// Candidate count above which [`Enumeration::Auto`] stops recursing.
pub const RECURSION_LIMIT: usize = 1024;

/// Enumeration strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Enumeration {
    #[default]
    Auto,
    Recursive,
    Iterative,
}

impl Enumeration {
    /// Concrete strategy for a candidate list of length `candidates`.
    #[must_use]
    pub const fn resolve(self, candidates: usize) -> Self {
        match self {
            Self::Auto if candidates > RECURSION_LIMIT => Self::Iterative,
            Self::Auto => Self::Recursive,
            other => other,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Recursive => "recursive",
            Self::Iterative => "iterative",
        }
    }
}

impl fmt::Display for Enumeration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Enumeration {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "recursive" => Ok(Self::Recursive),
            "iterative" => Ok(Self::Iterative),
            other => Err(format!(
                "unknown enumeration '{other}' (expected auto, recursive or iterative)"
            )),
        }
    }
}

/// A set of vertices, members kept sorted so equal sets compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CriticalSet<V> {
    members: Vec<V>,
}

impl<V: Ord> CriticalSet<V> {
    #[must_use]
    pub fn from_members(mut members: Vec<V>) -> Self {
        members.sort_unstable();
        members.dedup();
        Self { members }
    }

    #[must_use]
    pub fn members(&self) -> &[V] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn contains(&self, v: &V) -> bool {
        self.members.binary_search(v).is_ok()
    }
}

/// Enumerates the critical sets of one excluded vertex.
pub struct SubsetGenerator<'g, G: WeightedGraph> {
    graph: &'g G,
    excluded: G::Vertex,
    max_size: usize,
    direction: Direction,
}

enum Step {
    Enter(usize),
    Leave(usize),
}

impl<'g, G: WeightedGraph> SubsetGenerator<'g, G> {
    #[must_use]
    pub const fn new(graph: &'g G, excluded: G::Vertex, max_size: usize, direction: Direction) -> Self {
        Self {
            graph,
            excluded,
            max_size,
            direction,
        }
    }

    #[must_use]
    pub const fn excluded(&self) -> G::Vertex {
        self.excluded
    }

    /// Whether `v` may be a member: an edge `v → excluded` for incoming,
    /// `excluded → v` for outgoing.
    #[must_use]
    pub fn is_adjacent(&self, v: G::Vertex) -> bool {
        let (from, to) = self.direction.orient(v, self.excluded);
        self.graph.contains_edge(from, to)
    }

    /// Walk all critical sets drawn from `candidates` with the given strategy.
    pub fn enumerate<B, F>(
        &self,
        candidates: &[G::Vertex],
        strategy: Enumeration,
        visitor: F,
    ) -> ControlFlow<B>
    where
        F: FnMut(&[G::Vertex]) -> ControlFlow<B>,
    {
        match strategy.resolve(candidates.len()) {
            Enumeration::Iterative => self.visit_iterative(candidates, visitor),
            Enumeration::Recursive | Enumeration::Auto => self.visit(candidates, visitor),
        }
    }

    /// Recursive enumeration. The visitor sees each critical set once and may
    /// stop the walk by returning `Break`.
    pub fn visit<B, F>(&self, candidates: &[G::Vertex], mut visitor: F) -> ControlFlow<B>
    where
        F: FnMut(&[G::Vertex]) -> ControlFlow<B>,
    {
        let walk = Walk::new(self, candidates);
        let mut current = Vec::with_capacity(self.max_size.min(candidates.len()));
        walk.emit(&current, &mut visitor)?;
        walk.step(0, &mut current, &mut visitor)
    }

    /// Same walk and order as [`visit`](Self::visit), driven by an explicit
    /// stack instead of the call stack.
    pub fn visit_iterative<B, F>(&self, candidates: &[G::Vertex], mut visitor: F) -> ControlFlow<B>
    where
        F: FnMut(&[G::Vertex]) -> ControlFlow<B>,
    {
        let walk = Walk::new(self, candidates);
        let mut current = Vec::with_capacity(self.max_size.min(candidates.len()));
        walk.emit(&current, &mut visitor)?;

        let mut stack = vec![Step::Enter(0)];
        while let Some(step) = stack.pop() {
            match step {
                Step::Enter(i) if i == candidates.len() => {}
                Step::Enter(i) => {
                    if current.len() < self.max_size && walk.adjacent[i] {
                        current.push(candidates[i]);
                        walk.emit(&current, &mut visitor)?;
                        stack.push(Step::Leave(i));
                        stack.push(Step::Enter(i + 1));
                    } else {
                        stack.push(Step::Enter(i + 1));
                    }
                }
                Step::Leave(i) => {
                    current.pop();
                    stack.push(Step::Enter(i + 1));
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Collect every critical set.
    #[must_use]
    pub fn generate(&self, candidates: &[G::Vertex]) -> BTreeSet<CriticalSet<G::Vertex>> {
        let mut sets = BTreeSet::new();
        let _ = self.enumerate(candidates, Enumeration::Auto, |subset| {
            sets.insert(CriticalSet::from_members(subset.to_vec()));
            ControlFlow::<()>::Continue(())
        });
        sets
    }
}

/// Per-call enumeration state shared by both strategies.
struct Walk<'a, V> {
    candidates: &'a [V],
    adjacent: Vec<bool>,
    lookup: Vec<(V, bool)>,
    max_size: usize,
}

impl<'a, V: Copy + Ord> Walk<'a, V> {
    fn new<G: WeightedGraph<Vertex = V>>(generator: &SubsetGenerator<'_, G>, candidates: &'a [V]) -> Self {
        let adjacent: Vec<bool> = candidates
            .iter()
            .map(|&c| c != generator.excluded && generator.is_adjacent(c))
            .collect();
        let mut lookup: Vec<(V, bool)> = candidates.iter().copied().zip(adjacent.iter().copied()).collect();
        lookup.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        Self {
            candidates,
            adjacent,
            lookup,
            max_size: generator.max_size,
        }
    }

    fn member_ok(&self, v: V) -> bool {
        self.lookup
            .binary_search_by(|probe| probe.0.cmp(&v))
            .is_ok_and(|i| self.lookup[i].1)
    }

    /// Test the full subset and hand it to the visitor if it qualifies.
    fn emit<B, F>(&self, subset: &[V], visitor: &mut F) -> ControlFlow<B>
    where
        F: FnMut(&[V]) -> ControlFlow<B>,
    {
        if subset.iter().all(|&v| self.member_ok(v)) {
            visitor(subset)
        } else {
            ControlFlow::Continue(())
        }
    }

    fn step<B, F>(&self, i: usize, current: &mut Vec<V>, visitor: &mut F) -> ControlFlow<B>
    where
        F: FnMut(&[V]) -> ControlFlow<B>,
    {
        if i == self.candidates.len() {
            return ControlFlow::Continue(());
        }
        if current.len() < self.max_size && self.adjacent[i] {
            current.push(self.candidates[i]);
            let flow = match self.emit(current, visitor) {
                ControlFlow::Continue(()) => self.step(i + 1, current, visitor),
                brk @ ControlFlow::Break(_) => brk,
            };
            current.pop();
            flow?;
        }
        self.step(i + 1, current, visitor)
    }
}
