//! Entity dependency graph with deterministic topological ordering
//!
//! Nodes are the pack's entities, stored in a petgraph arena. An edge runs
//! from a dependency to each entity that references it, so a topological
//! walk visits dependencies first. Ties are broken by descriptor order,
//! which makes the install order identical on every run over the same pack.

use lodestone_core::types::{Entity, EntityDescriptor};
use lodestone_core::{Error, Result};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Validated, acyclic dependency graph over one content pack's entities
#[derive(Debug, Clone)]
pub struct EntityGraph {
    graph: DiGraph<EntityDescriptor, ()>,
    index: BTreeMap<EntityDescriptor, NodeIndex>,
    entities: BTreeMap<EntityDescriptor, Entity>,
    order: Vec<NodeIndex>,
}

impl EntityGraph {
    /// Build the graph and compute its install order
    ///
    /// Fails if two entities share a descriptor, if any entity references
    /// a descriptor the pack does not declare, or if references form a cycle.
    pub fn build(entities: &[Entity]) -> Result<Self> {
        let mut graph = DiGraph::with_capacity(entities.len(), entities.len());
        let mut index = BTreeMap::new();
        let mut by_descriptor = BTreeMap::new();

        for entity in entities {
            let descriptor = entity.descriptor();
            if index.contains_key(&descriptor) {
                return Err(Error::DuplicateEntity { entity: descriptor });
            }
            let node = graph.add_node(descriptor.clone());
            index.insert(descriptor.clone(), node);
            by_descriptor.insert(descriptor, entity.clone());
        }

        let mut unexpected = BTreeSet::new();
        let mut edges = Vec::new();
        for (descriptor, entity) in &by_descriptor {
            let dependent = index[descriptor];
            for reference in entity.references() {
                match index.get(&reference) {
                    Some(&dependency) => edges.push((dependency, dependent)),
                    None => {
                        unexpected.insert(reference);
                    }
                }
            }
        }

        if !unexpected.is_empty() {
            return Err(Error::UnexpectedEntity {
                entities: unexpected.into_iter().collect(),
            });
        }

        for (dependency, dependent) in edges {
            graph.add_edge(dependency, dependent, ());
        }

        let order = Self::topological_order(&graph)?;
        debug!(
            "Resolved install order for {} entities: {}",
            order.len(),
            order
                .iter()
                .map(|n| graph[*n].to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            graph,
            index,
            entities: by_descriptor,
            order,
        })
    }

    /// Kahn's algorithm with a descriptor-ordered ready set
    fn topological_order(graph: &DiGraph<EntityDescriptor, ()>) -> Result<Vec<NodeIndex>> {
        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();

        let mut ready: BTreeMap<&EntityDescriptor, NodeIndex> = graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(|n| (&graph[n], n))
            .collect();

        let mut order = Vec::with_capacity(graph.node_count());
        while let Some((_, node)) = ready.pop_first() {
            order.push(node);
            for dependent in graph.neighbors_directed(node, Direction::Outgoing) {
                let degree = &mut in_degree[dependent.index()];
                *degree -= 1;
                if *degree == 0 {
                    ready.insert(&graph[dependent], dependent);
                }
            }
        }

        if order.len() < graph.node_count() {
            let remaining: BTreeSet<NodeIndex> = graph
                .node_indices()
                .filter(|n| in_degree[n.index()] > 0)
                .collect();
            return Err(Error::CyclicDependency {
                cycle: Self::find_cycle(graph, &remaining),
            });
        }

        Ok(order)
    }

    /// Extract one cycle from the nodes Kahn's algorithm could not order
    ///
    /// Every remaining node still has a remaining dependency, so walking
    /// dependencies from any of them must revisit a node. The witness reads
    /// in "depends on" direction and repeats its first element at the end.
    fn find_cycle(
        graph: &DiGraph<EntityDescriptor, ()>,
        remaining: &BTreeSet<NodeIndex>,
    ) -> Vec<EntityDescriptor> {
        let Some(start) = remaining.iter().copied().min_by(|a, b| graph[*a].cmp(&graph[*b])) else {
            return Vec::new();
        };

        let mut path = vec![start];
        let mut position = BTreeMap::from([(start, 0usize)]);
        let mut current = start;

        loop {
            let next = graph
                .neighbors_directed(current, Direction::Incoming)
                .filter(|n| remaining.contains(n))
                .min_by(|a, b| graph[*a].cmp(&graph[*b]));

            let Some(next) = next else {
                // Unreachable for a residual Kahn graph; report what we walked
                return path.iter().map(|n| graph[*n].clone()).collect();
            };

            if let Some(&at) = position.get(&next) {
                let mut cycle: Vec<EntityDescriptor> =
                    path[at..].iter().map(|n| graph[*n].clone()).collect();
                cycle.push(graph[next].clone());
                return cycle;
            }

            position.insert(next, path.len());
            path.push(next);
            current = next;
        }
    }

    /// Entities in install order (dependencies first)
    pub fn install_order(&self) -> Vec<&Entity> {
        self.order
            .iter()
            .map(|n| &self.entities[&self.graph[*n]])
            .collect()
    }

    /// Entities in uninstall order (dependents first)
    pub fn uninstall_order(&self) -> Vec<&Entity> {
        let mut order = self.install_order();
        order.reverse();
        order
    }

    /// Descriptors in install order
    pub fn ordered_descriptors(&self) -> Vec<EntityDescriptor> {
        self.order.iter().map(|n| self.graph[*n].clone()).collect()
    }

    /// Direct dependencies of an entity
    pub fn dependencies_of(&self, descriptor: &EntityDescriptor) -> BTreeSet<EntityDescriptor> {
        self.index
            .get(descriptor)
            .map(|&node| {
                self.graph
                    .neighbors_directed(node, Direction::Incoming)
                    .map(|n| self.graph[n].clone())
                    .collect()
            })
            .unwrap_or_default()
    }


    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::types::{
        model_types, ModelId, ModelType, Reference, ReferenceMap, ValueReference,
    };

    fn descriptor(id: &str, model_type: ModelType) -> EntityDescriptor {
        EntityDescriptor::new(ModelId::from(id), model_type)
    }

    fn entity(id: &str, model_type: ModelType, deps: &[EntityDescriptor]) -> Entity {
        let mut data = ReferenceMap::new();
        data.insert("title".into(), ValueReference::of(id).into());
        if !deps.is_empty() {
            data.insert(
                "refs".into(),
                Reference::List(deps.iter().cloned().map(Reference::entity).collect()),
            );
        }
        Entity::new(id, model_type, data)
    }

    fn ids(graph: &EntityGraph) -> Vec<String> {
        graph
            .install_order()
            .iter()
            .map(|e| e.id.to_string())
            .collect()
    }

    #[test]
    fn test_chain_visits_dependencies_first() {
        let c = descriptor("c", model_types::output());
        let b = descriptor("b", model_types::output());
        let entities = vec![
            entity("a", model_types::output(), &[b.clone()]),
            entity("b", model_types::output(), &[c]),
            entity("c", model_types::output(), &[]),
        ];

        for _ in 0..5 {
            let graph = EntityGraph::build(&entities).unwrap();
            assert_eq!(ids(&graph), vec!["c", "b", "a"]);
        }
    }

    #[test]
    fn test_independent_entities_ordered_by_descriptor() {
        let entities = vec![
            entity("z", model_types::output(), &[]),
            entity("m", model_types::input(), &[]),
            entity("a", model_types::output(), &[]),
        ];
        let reversed: Vec<Entity> = entities.iter().rev().cloned().collect();

        let first = EntityGraph::build(&entities).unwrap();
        let second = EntityGraph::build(&reversed).unwrap();
        assert_eq!(ids(&first), ids(&second));
        // input:1 sorts before output:1
        assert_eq!(ids(&first), vec!["m", "a", "z"]);
    }

    #[test]
    fn test_diamond() {
        let base = descriptor("base", model_types::grok_pattern());
        let left = descriptor("left", model_types::output());
        let right = descriptor("right", model_types::output());
        let entities = vec![
            entity("top", model_types::stream(), &[left.clone(), right.clone()]),
            entity("left", model_types::output(), &[base.clone()]),
            entity("right", model_types::output(), &[base.clone()]),
            entity("base", model_types::grok_pattern(), &[]),
        ];
        let graph = EntityGraph::build(&entities).unwrap();
        assert_eq!(ids(&graph), vec!["base", "left", "right", "top"]);

        let top = descriptor("top", model_types::stream());
        assert_eq!(graph.dependencies_of(&top), BTreeSet::from([left.clone(), right]));
        assert_eq!(graph.dependencies_of(&left), BTreeSet::from([base.clone()]));
        assert!(graph.dependencies_of(&base).is_empty());
    }

    #[test]
    fn test_duplicate_descriptor_rejected() {
        let entities = vec![
            entity("a", model_types::output(), &[]),
            entity("a", model_types::output(), &[]),
        ];
        assert!(matches!(
            EntityGraph::build(&entities),
            Err(Error::DuplicateEntity { .. })
        ));
    }

    #[test]
    fn test_same_id_different_type_is_distinct() {
        let entities = vec![
            entity("a", model_types::output(), &[]),
            entity("a", model_types::stream(), &[]),
        ];
        assert_eq!(EntityGraph::build(&entities).unwrap().len(), 2);
    }

    #[test]
    fn test_undeclared_reference_rejected() {
        let ghost = descriptor("ghost", model_types::output());
        let phantom = descriptor("phantom", model_types::input());
        let entities = vec![entity(
            "s",
            model_types::stream(),
            &[ghost.clone(), phantom.clone()],
        )];

        match EntityGraph::build(&entities) {
            Err(Error::UnexpectedEntity { entities }) => {
                assert_eq!(entities, vec![phantom, ghost]);
            }
            other => panic!("expected UnexpectedEntity, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_reports_witness() {
        let a = descriptor("a", model_types::output());
        let b = descriptor("b", model_types::output());
        let entities = vec![
            entity("a", model_types::output(), &[b.clone()]),
            entity("b", model_types::output(), &[a.clone()]),
            entity("c", model_types::output(), &[]),
        ];

        match EntityGraph::build(&entities) {
            Err(Error::CyclicDependency { cycle }) => {
                assert_eq!(cycle, vec![a.clone(), b, a]);
            }
            other => panic!("expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_self_reference_is_a_cycle() {
        let a = descriptor("a", model_types::output());
        let entities = vec![entity("a", model_types::output(), &[a.clone()])];
        match EntityGraph::build(&entities) {
            Err(Error::CyclicDependency { cycle }) => assert_eq!(cycle, vec![a.clone(), a]),
            other => panic!("expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_cycle_downstream_of_acyclic_part() {
        let root = descriptor("root", model_types::output());
        let x = descriptor("x", model_types::stream());
        let y = descriptor("y", model_types::stream());
        let entities = vec![
            entity("root", model_types::output(), &[]),
            entity("x", model_types::stream(), &[root.clone(), y.clone()]),
            entity("y", model_types::stream(), &[x.clone()]),
        ];
        match EntityGraph::build(&entities) {
            Err(Error::CyclicDependency { cycle }) => assert_eq!(cycle, vec![x.clone(), y, x]),
            other => panic!("expected CyclicDependency, got {:?}", other),
        }
    }

    #[test]
    fn test_uninstall_order_is_reverse() {
        let b = descriptor("b", model_types::output());
        let entities = vec![
            entity("a", model_types::stream(), &[b]),
            entity("b", model_types::output(), &[]),
        ];
        let graph = EntityGraph::build(&entities).unwrap();
        let ids: Vec<_> = graph.uninstall_order().iter().map(|e| e.id.to_string()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }
}
