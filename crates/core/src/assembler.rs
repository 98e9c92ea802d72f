use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde_json::Value;
use tracing::{info, instrument, warn};

use crate::{
    AttrPair, Delay, EdgeBuilder, Error, FactoryArgs, Kind, Node, NodeId, NodeRegistry, Seed,
    StyleDescriptor, StyleRegistry, Topology,
};

/// The composition root of a scenario.
///
/// Owns the node registry, the edge builder, the style registries of every
/// visualization sink, and the random stream used by randomized wiring.
/// A scenario drives one assembler from start to finish and calls
/// [`finish`](Self::finish) to obtain the sealed [`Topology`].
///
/// The random stream is fixed at construction. There is no way to reseed it
/// mid-build, so the same scenario with the same seed always produces the same
/// topology.
///
/// A failed creation or wiring call leaves the assembler usable, but [`finish`](Self::finish)
/// then returns the first failure instead of a topology.
pub struct Assembler<K: Kind, R = ChaCha8Rng> {
    registry: NodeRegistry<K>,
    builder: EdgeBuilder,
    styles: BTreeMap<NodeId, StyleRegistry>,
    rng: R,
    failure: Option<Error>,
}

impl<K: Kind> Assembler<K> {
    /// Creates an assembler whose random stream is seeded with `seed`.
    #[must_use]
    pub fn seeded(registry: NodeRegistry<K>, seed: u64) -> Self {
        Self::new(registry, ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<K: Kind, R: Rng> Assembler<K, R> {
    #[must_use]
    pub fn new(registry: NodeRegistry<K>, rng: R) -> Self {
        Self {
            registry,
            builder: EdgeBuilder::new(),
            styles: BTreeMap::new(),
            rng,
            failure: None,
        }
    }

    /// See [`NodeRegistry::create`].
    ///
    /// # Errors
    ///
    /// Fails if the registry fails to create the component.
    pub fn create(&mut self, type_name: &str, args: &FactoryArgs) -> Result<Node<K>, Error> {
        let result = self.registry.create(type_name, args);
        self.track(result)
    }

    /// See [`NodeRegistry::create_many`].
    ///
    /// # Errors
    ///
    /// Fails if the registry fails to create any instance.
    pub fn create_many(
        &mut self,
        type_name: &str,
        count: usize,
        per_instance: impl FnMut(usize) -> FactoryArgs,
    ) -> Result<Vec<Node<K>>, Error> {
        let result = self.registry.create_many(type_name, count, per_instance);
        self.track(result)
    }

    pub fn find(&self, predicate: impl Fn(&NodeId, K) -> bool) -> Vec<Node<K>> {
        self.registry.find(predicate)
    }

    /// See [`NodeRegistry::resolve_by_suffix`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousOrMissingNode`] unless exactly one node matches.
    pub fn resolve_by_suffix(&self, kind: K, suffix: &str) -> Result<Node<K>, Error> {
        self.registry.resolve_by_suffix(kind, suffix)
    }

    /// See [`NodeRegistry::resolve_bus_by_suffix`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::AmbiguousOrMissingNode`] unless exactly one bus matches.
    pub fn resolve_bus_by_suffix(&self, suffix: &str) -> Result<Node<K>, Error> {
        self.registry.resolve_bus_by_suffix(suffix)
    }

    /// See [`NodeRegistry::data`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingData`] if the node has no entry for `key`.
    pub fn data<'a>(&self, node: &'a Node<K>, key: &str) -> Result<&'a Value, Error> {
        self.registry.data(node, key)
    }

    #[must_use]
    pub fn registry(&self) -> &NodeRegistry<K> {
        &self.registry
    }

    #[must_use]
    pub fn builder(&self) -> &EdgeBuilder {
        &self.builder
    }

    /// Wires `src` to `dst` with same-step edges.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignNode`] if either node was created elsewhere, otherwise
    /// see [`EdgeBuilder::connect`].
    pub fn connect<A: Into<AttrPair>>(
        &mut self,
        src: &Node<K>,
        dst: &Node<K>,
        attrs: impl IntoIterator<Item = A>,
    ) -> Result<(), Error> {
        self.connect_with(src, dst, attrs, Delay::SameStep, None)
    }

    /// Wires `src` to `dst` with one-step-shifted edges seeded with `seed`.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignNode`] if either node was created elsewhere, otherwise
    /// see [`EdgeBuilder::connect`].
    pub fn connect_shifted<A: Into<AttrPair>>(
        &mut self,
        src: &Node<K>,
        dst: &Node<K>,
        attrs: impl IntoIterator<Item = A>,
        seed: Seed,
    ) -> Result<(), Error> {
        self.connect_with(src, dst, attrs, Delay::OneStepShifted, Some(seed))
    }

    /// Wires `src` to `dst` with an explicit delay and optional seed.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignNode`] if either node was created elsewhere, otherwise
    /// see [`EdgeBuilder::connect`].
    pub fn connect_with<A: Into<AttrPair>>(
        &mut self,
        src: &Node<K>,
        dst: &Node<K>,
        attrs: impl IntoIterator<Item = A>,
        delay: Delay,
        seed: Option<Seed>,
    ) -> Result<(), Error> {
        let result = self
            .ensure_registered([src, dst])
            .and_then(|()| self.builder.connect(src, dst, attrs, delay, seed));
        self.track(result)
    }

    /// # Errors
    ///
    /// [`Error::ForeignNode`] if any node was created elsewhere, otherwise see
    /// [`EdgeBuilder::connect_many_to_one`].
    pub fn connect_many_to_one<S: AsRef<str>>(
        &mut self,
        sources: &[Node<K>],
        dst: &Node<K>,
        attrs: &[S],
    ) -> Result<(), Error> {
        let result = self
            .ensure_registered(sources.iter().chain([dst]))
            .and_then(|()| self.builder.connect_many_to_one(sources, dst, attrs));
        self.track(result)
    }

    /// Wires each source to `degree` candidates drawn from the assembler's
    /// random stream.
    ///
    /// # Errors
    ///
    /// [`Error::ForeignNode`] if any node was created elsewhere, otherwise see
    /// [`EdgeBuilder::connect_randomly`].
    pub fn connect_randomly<A: Into<AttrPair>>(
        &mut self,
        sources: &[Node<K>],
        candidates: &[Node<K>],
        attr: A,
        degree: usize,
    ) -> Result<(), Error> {
        let result = self
            .ensure_registered(sources.iter().chain(candidates))
            .and_then(|()| {
                self.builder
                    .connect_randomly(sources, candidates, attr, degree, &mut self.rng)
            });
        self.track(result)
    }

    /// # Errors
    ///
    /// [`Error::ForeignNode`] if either node was created elsewhere, otherwise
    /// see [`EdgeBuilder::break_cycle`].
    pub fn break_cycle<F: Into<AttrPair>, B: Into<AttrPair>>(
        &mut self,
        a: &Node<K>,
        b: &Node<K>,
        forward: F,
        backward: B,
        seed: Seed,
    ) -> Result<(), Error> {
        let result = self
            .ensure_registered([a, b])
            .and_then(|()| self.builder.break_cycle(a, b, forward, backward, seed));
        self.track(result)
    }

    /// Registers how the visualization sink `sink` renders components of `kind`.
    ///
    /// # Errors
    ///
    /// - [`Error::ForeignNode`] if `sink` was created elsewhere.
    /// - [`Error::InvalidDescriptor`] if `min <= default <= max` does not hold.
    /// - [`Error::UnknownAttribute`] or [`Error::WrongDirection`] if the bound
    ///   attribute is not a readable attribute of `kind`.
    pub fn register_style(
        &mut self,
        sink: &Node<K>,
        kind: K,
        descriptor: StyleDescriptor,
    ) -> Result<(), Error> {
        let result = self.add_style(sink, kind, descriptor);
        self.track(result)
    }

    /// Tells the visualization sink `sink` not to display the given kinds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ForeignNode`] if `sink` was created elsewhere.
    pub fn ignore_types(
        &mut self,
        sink: &Node<K>,
        kinds: impl IntoIterator<Item = K>,
    ) -> Result<(), Error> {
        let result = self.ensure_registered([sink]);
        self.track(result)?;
        self.styles
            .entry(sink.id().clone())
            .or_default()
            .ignore(kinds.into_iter().map(|kind| kind.name()));
        Ok(())
    }

    /// Seals the edge set and returns the finished topology.
    ///
    /// # Errors
    ///
    /// Returns the first error any earlier call on this assembler reported.
    /// A topology is only handed out if every call succeeded.
    #[instrument(skip_all)]
    pub fn finish(mut self) -> Result<Topology<K>, Error> {
        if let Some(error) = self.failure {
            warn!(%error, "assembly failed, no topology produced");
            return Err(error);
        }

        let edges = self.builder.seal();
        let warnings = self.builder.take_warnings();
        info!(
            nodes = self.registry.len(),
            edges = edges.len(),
            delayed = edges.iter().filter(|edge| edge.is_shifted()).count(),
            duplicates = warnings.len(),
            "topology sealed"
        );
        Ok(Topology::new(
            self.registry.into_nodes(),
            edges,
            self.styles,
            warnings,
        ))
    }

    fn add_style(
        &mut self,
        sink: &Node<K>,
        kind: K,
        descriptor: StyleDescriptor,
    ) -> Result<(), Error> {
        self.ensure_registered([sink])?;
        match kind.attribute(&descriptor.bound_attribute) {
            Some(access) if access.is_readable() => {}
            Some(_) => {
                return Err(Error::WrongDirection {
                    node: sink.id().clone(),
                    attribute: descriptor.bound_attribute,
                    expected: crate::Access::Read,
                });
            }
            None => {
                return Err(Error::UnknownAttribute {
                    node: sink.id().clone(),
                    kind: kind.name(),
                    attribute: descriptor.bound_attribute,
                });
            }
        }

        self.styles
            .entry(sink.id().clone())
            .or_default()
            .register(kind.name(), descriptor)?;
        Ok(())
    }

    /// Checks that every node is a handle this assembler's registry created.
    fn ensure_registered<'n>(
        &self,
        nodes: impl IntoIterator<Item = &'n Node<K>>,
    ) -> Result<(), Error> {
        for node in nodes {
            match self.registry.get(node.id().as_str()) {
                Some(registered) if registered.kind() == node.kind() => {}
                _ => {
                    return Err(Error::ForeignNode {
                        node: node.id().clone(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Remembers the first failure so `finish` can report it.
    fn track<T>(&mut self, result: Result<T, Error>) -> Result<T, Error> {
        if let Err(error) = &result {
            self.failure.get_or_insert_with(|| error.clone());
        }
        result
    }
}
