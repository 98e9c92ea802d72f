use std::{collections::HashSet, sync::Arc};

use rand::{Rng, seq::index};
use tracing::{debug, warn};

use crate::{AttrPair, Delay, DependencyGraph, Edge, Endpoint, Error, Kind, Node, Seed};

/// Reported when the same pair of slots is wired more than once.
///
/// Duplicate declarations are kept, since it is not known whether a scenario
/// wires a pair twice on purpose. The kernel receiving the topology decides
/// whether to reject or double-deliver them.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateEdgeWarning {
    /// The repeated declaration.
    pub edge: Edge,

    /// How many edges wire this pair of slots, including this one.
    pub occurrences: usize,
}

/// Accumulates the edges of a topology.
///
/// The builder starts open and accepts wiring calls until [`seal`] is called.
/// After that, every wiring call fails with [`Error::BuilderSealed`] and the
/// sealed edge set never changes.
///
/// Each wiring call is all-or-nothing: if any edge it declares is invalid,
/// none of them are added.
///
/// [`seal`]: EdgeBuilder::seal
#[derive(Debug, Default)]
pub struct EdgeBuilder {
    state: State,
    same_step: DependencyGraph,
    warnings: Vec<DuplicateEdgeWarning>,
}

#[derive(Debug)]
enum State {
    Open(Vec<Edge>),
    Sealed(Arc<[Edge]>),
}

impl Default for State {
    fn default() -> Self {
        State::Open(Vec::new())
    }
}

impl EdgeBuilder {
    /// Creates an open builder with no edges.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wires `src` to `dst`, adding one edge per attribute pair.
    ///
    /// A [`Delay::OneStepShifted`] edge requires a `seed`, which the kernel
    /// delivers to the destination before the first delayed value exists. A
    /// [`Delay::SameStep`] edge must not carry one.
    ///
    /// # Errors
    ///
    /// - [`Error::BuilderSealed`] if the builder is sealed.
    /// - [`Error::UnknownAttribute`] if either node does not declare its slot.
    /// - [`Error::WrongDirection`] if the source slot is not readable or the
    ///   destination slot is not writable.
    /// - [`Error::MissingSeed`] or [`Error::UnexpectedSeed`] if the seed does
    ///   not match the delay.
    /// - [`Error::SameStepCycle`] if a same-step edge closes a dependency cycle.
    pub fn connect<K, A>(
        &mut self,
        src: &Node<K>,
        dst: &Node<K>,
        attrs: impl IntoIterator<Item = A>,
        delay: Delay,
        seed: Option<Seed>,
    ) -> Result<(), Error>
    where
        K: Kind,
        A: Into<AttrPair>,
    {
        self.ensure_open()?;

        let planned = attrs
            .into_iter()
            .map(|pair| {
                let pair = pair.into();
                let source = readable(src, &pair.source)?;
                let destination = writable(dst, &pair.destination)?;
                plan(source, destination, delay, seed.clone())
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.commit(planned)
    }

    /// Wires the same attributes of many sources into one sink.
    ///
    /// Each source's attribute lands in its own namespaced slot
    /// `"<source id>.<attribute>"`, so the sink can tell producers of the same
    /// attribute apart. The sink must accept arbitrary inputs.
    ///
    /// # Errors
    ///
    /// - [`Error::BuilderSealed`] if the builder is sealed.
    /// - [`Error::UnknownAttribute`] if a source does not declare an attribute,
    ///   or the sink does not accept the namespaced slot.
    /// - [`Error::WrongDirection`] if a source attribute is not readable.
    /// - [`Error::SameStepCycle`] if an edge closes a dependency cycle.
    pub fn connect_many_to_one<K, S>(
        &mut self,
        sources: &[Node<K>],
        dst: &Node<K>,
        attrs: &[S],
    ) -> Result<(), Error>
    where
        K: Kind,
        S: AsRef<str>,
    {
        self.ensure_open()?;

        let mut planned = Vec::with_capacity(sources.len() * attrs.len());
        for src in sources {
            for attr in attrs {
                let attr = attr.as_ref();
                let source = readable(src, attr)?;
                let destination = writable(dst, &format!("{}.{attr}", src.id()))?;
                planned.push(plan(source, destination, Delay::SameStep, None)?);
            }
        }

        self.commit(planned)
    }

    /// Wires each source to `degree` distinct candidates chosen at random.
    ///
    /// Candidates are drawn uniformly without replacement from `rng`, one
    /// source at a time in order. A candidate listed more than once counts
    /// once. The same random stream state and inputs always produce the same
    /// edges.
    ///
    /// # Errors
    ///
    /// - [`Error::BuilderSealed`] if the builder is sealed.
    /// - [`Error::NotEnoughCandidates`] if `degree` exceeds the candidate count.
    /// - Any error [`connect`](Self::connect) reports for the chosen pairs.
    pub fn connect_randomly<K, A, R>(
        &mut self,
        sources: &[Node<K>],
        candidates: &[Node<K>],
        attr: A,
        degree: usize,
        rng: &mut R,
    ) -> Result<(), Error>
    where
        K: Kind,
        A: Into<AttrPair>,
        R: Rng + ?Sized,
    {
        self.ensure_open()?;

        let mut seen = HashSet::new();
        let candidates: Vec<_> = candidates
            .iter()
            .filter(|candidate| seen.insert(candidate.id()))
            .collect();

        let pair = attr.into();
        let mut planned = Vec::with_capacity(sources.len() * degree);
        for src in sources {
            if degree > candidates.len() {
                return Err(Error::NotEnoughCandidates {
                    node: src.id().clone(),
                    degree,
                    available: candidates.len(),
                });
            }

            for position in index::sample(rng, candidates.len(), degree) {
                let dst = candidates[position];
                let source = readable(src, &pair.source)?;
                let destination = writable(dst, &pair.destination)?;
                planned.push(plan(source, destination, Delay::SameStep, None)?);
            }
        }

        self.commit(planned)
    }

    /// Wires two components that influence each other within one step.
    ///
    /// Adds `a -> b` for `forward` as a same-step edge and `b -> a` for
    /// `backward` as a shifted edge seeded with `seed`, so `a` sees the value
    /// `b` produced in the previous step.
    ///
    /// # Errors
    ///
    /// Any error [`connect`](Self::connect) reports for either edge. If the
    /// shifted edge fails, the same-step edge is not added either.
    pub fn break_cycle<K, F, B>(
        &mut self,
        a: &Node<K>,
        b: &Node<K>,
        forward: F,
        backward: B,
        seed: Seed,
    ) -> Result<(), Error>
    where
        K: Kind,
        F: Into<AttrPair>,
        B: Into<AttrPair>,
    {
        self.ensure_open()?;

        let forward = forward.into();
        let backward = backward.into();
        let planned = vec![
            plan(
                readable(a, &forward.source)?,
                writable(b, &forward.destination)?,
                Delay::SameStep,
                None,
            )?,
            plan(
                readable(b, &backward.source)?,
                writable(a, &backward.destination)?,
                Delay::OneStepShifted,
                Some(seed),
            )?,
        ];

        self.commit(planned)
    }

    /// Seals the builder and returns the finished edge set.
    ///
    /// Calling `seal` again returns the same edge set.
    pub fn seal(&mut self) -> Arc<[Edge]> {
        let edges: Arc<[Edge]> = match &mut self.state {
            State::Open(edges) => std::mem::take(edges).into(),
            State::Sealed(edges) => return Arc::clone(edges),
        };
        self.state = State::Sealed(Arc::clone(&edges));
        edges
    }

    #[must_use]
    pub fn is_sealed(&self) -> bool {
        matches!(self.state, State::Sealed(_))
    }

    /// The edges declared so far, in declaration order.
    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        match &self.state {
            State::Open(edges) => edges,
            State::Sealed(edges) => edges,
        }
    }

    /// Duplicate declarations seen so far.
    #[must_use]
    pub fn warnings(&self) -> &[DuplicateEdgeWarning] {
        &self.warnings
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<DuplicateEdgeWarning> {
        std::mem::take(&mut self.warnings)
    }

    fn ensure_open(&self) -> Result<(), Error> {
        match self.state {
            State::Open(_) => Ok(()),
            State::Sealed(_) => Err(Error::BuilderSealed),
        }
    }

    /// Adds validated edges, rejecting the whole batch if one closes a cycle.
    fn commit(&mut self, planned: Vec<Edge>) -> Result<(), Error> {
        let State::Open(edges) = &mut self.state else {
            return Err(Error::BuilderSealed);
        };

        let mut added = Vec::new();
        for edge in planned.iter().filter(|edge| edge.delay == Delay::SameStep) {
            let (from, to) = (&edge.source.node, &edge.destination.node);
            if self.same_step.would_close_cycle(from, to) {
                for index in added.into_iter().rev() {
                    self.same_step.remove_dependency(index);
                }
                return Err(Error::SameStepCycle {
                    from: edge.source.clone(),
                    to: edge.destination.clone(),
                });
            }
            added.push(self.same_step.add_dependency(from, to));
        }

        for edge in planned {
            let occurrences = 1 + edges.iter().filter(|e| e.same_wiring(&edge)).count();
            if occurrences > 1 {
                warn!(%edge, occurrences, "duplicate edge declaration");
                self.warnings.push(DuplicateEdgeWarning {
                    edge: edge.clone(),
                    occurrences,
                });
            }
            debug!(%edge, "added edge");
            edges.push(edge);
        }

        Ok(())
    }
}

/// Resolves a slot that an edge reads from.
fn readable<K: Kind>(node: &Node<K>, attribute: &str) -> Result<Endpoint, Error> {
    let kind = node.kind();
    match kind.attribute(attribute) {
        Some(access) if access.is_readable() => Ok(Endpoint::new(node.id().clone(), attribute)),
        Some(_) => Err(Error::WrongDirection {
            node: node.id().clone(),
            attribute: attribute.to_owned(),
            expected: crate::Access::Read,
        }),
        None => Err(Error::UnknownAttribute {
            node: node.id().clone(),
            kind: kind.name(),
            attribute: attribute.to_owned(),
        }),
    }
}

/// Resolves a slot that an edge writes into.
fn writable<K: Kind>(node: &Node<K>, attribute: &str) -> Result<Endpoint, Error> {
    let kind = node.kind();
    match kind.attribute(attribute) {
        Some(access) if access.is_writable() => Ok(Endpoint::new(node.id().clone(), attribute)),
        Some(_) => Err(Error::WrongDirection {
            node: node.id().clone(),
            attribute: attribute.to_owned(),
            expected: crate::Access::Write,
        }),
        None if kind.accepts_any_input() => Ok(Endpoint::new(node.id().clone(), attribute)),
        None => Err(Error::UnknownAttribute {
            node: node.id().clone(),
            kind: kind.name(),
            attribute: attribute.to_owned(),
        }),
    }
}

/// Builds an edge, checking that a seed is present exactly when it is shifted.
fn plan(
    source: Endpoint,
    destination: Endpoint,
    delay: Delay,
    seed: Option<Seed>,
) -> Result<Edge, Error> {
    match (delay, seed) {
        (Delay::OneStepShifted, None) => Err(Error::MissingSeed {
            from: source,
            to: destination,
        }),
        (Delay::SameStep, Some(_)) => Err(Error::UnexpectedSeed {
            from: source,
            to: destination,
        }),
        (delay, seed) => Ok(Edge {
            source,
            destination,
            delay,
            seed,
        }),
    }
}
