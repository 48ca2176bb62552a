//! Validated topology snapshot.
//!
//! A `Snapshot` is built once from the three raw collections and never
//! mutated afterwards; a reload produces a new snapshot that replaces the
//! old one wholesale.
//!
//! Validation has two outcomes:
//! - shape errors (duplicate ids, blank node ids) reject the whole load;
//! - data-quality problems (dangling edges, unknown fragment references)
//!   become `TopologyWarning`s that travel with the snapshot. Records are
//!   never dropped because of a warning.

use crate::schema::{ActorGroup, Fragment, MaterializedView};

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// The three collections as fetched, before any cross-record checks.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTopology {
    pub actor_groups: Vec<ActorGroup>,
    pub fragments: Vec<Fragment>,
    pub materialized_views: Vec<MaterializedView>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ShapeError {
    #[error("actor group #{index} has an empty node id")]
    BlankNode { index: usize },

    #[error("duplicate node id in actor listing: {node}")]
    DuplicateNode { node: String },

    #[error("duplicate actor id {actor} on node {node}")]
    DuplicateActor { node: String, actor: u32 },

    #[error("duplicate fragment id in fragment listing: {fragment}")]
    DuplicateFragment { fragment: u32 },

    #[error("duplicate materialized view id: {view}")]
    DuplicateView { view: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopologyWarning {
    DanglingDownstream {
        node: String,
        actor: u32,
        downstream: u32,
    },
    UnknownViewFragment {
        view: String,
        fragment: u32,
    },
    MissingFragmentMember {
        fragment: u32,
        actor: u32,
    },
    FragmentMismatch {
        actor: u32,
        listed_in: u32,
        declared: u32,
    },
}

impl fmt::Display for TopologyWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopologyWarning::DanglingDownstream {
                node,
                actor,
                downstream,
            } => write!(
                f,
                "actor {} on node {} points downstream to unknown actor {}",
                actor, node, downstream
            ),
            TopologyWarning::UnknownViewFragment { view, fragment } => write!(
                f,
                "materialized view {} depends on unknown fragment {}",
                view, fragment
            ),
            TopologyWarning::MissingFragmentMember { fragment, actor } => write!(
                f,
                "fragment {} lists actor {} which is not in the actor listing",
                fragment, actor
            ),
            TopologyWarning::FragmentMismatch {
                actor,
                listed_in,
                declared,
            } => write!(
                f,
                "actor {} is listed in fragment {} but declares fragment {}",
                actor, listed_in, declared
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    actor_groups: Vec<ActorGroup>,
    fragments: Vec<Fragment>,
    materialized_views: Vec<MaterializedView>,
    warnings: Vec<TopologyWarning>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotSummary {
    pub nodes: usize,
    pub actors: usize,
    pub edges: usize,
    pub fragments: usize,
    pub materialized_views: usize,
    pub warnings: usize,
}

impl Snapshot {
    /// Check cross-record invariants and build a snapshot.
    ///
    /// Runs in four phases:
    /// 1) node and actor identity (unique node ids, unique actor ids per node);
    /// 2) downstream edges resolve somewhere in the snapshot;
    /// 3) fragments: taken from the listing, or derived from actors if empty;
    /// 4) materialized views reference known fragments.
    ///
    /// Insertion order of every collection is preserved.
    pub fn validate(raw: RawTopology) -> Result<Snapshot, ShapeError> {
        let RawTopology {
            actor_groups,
            fragments,
            materialized_views,
        } = raw;
        let mut warnings = Vec::new();

        // Phase 1: identity.
        let mut nodes = BTreeSet::<&str>::new();
        // Actor ids are only unique per node, so one id may declare several
        // fragments across the snapshot.
        let mut actor_fragments = BTreeMap::<u32, Vec<u32>>::new();
        for (index, group) in actor_groups.iter().enumerate() {
            if group.node.trim().is_empty() {
                return Err(ShapeError::BlankNode { index });
            }
            if !nodes.insert(group.node.as_str()) {
                return Err(ShapeError::DuplicateNode {
                    node: group.node.clone(),
                });
            }
            let mut local = BTreeSet::new();
            for actor in &group.actors {
                if !local.insert(actor.id) {
                    return Err(ShapeError::DuplicateActor {
                        node: group.node.clone(),
                        actor: actor.id,
                    });
                }
                let declared = actor_fragments.entry(actor.id).or_default();
                if !declared.contains(&actor.fragment_id) {
                    declared.push(actor.fragment_id);
                }
            }
        }

        // Phase 2: every downstream id must resolve.
        for group in &actor_groups {
            for actor in &group.actors {
                for &downstream in &actor.downstream {
                    if !actor_fragments.contains_key(&downstream) {
                        warnings.push(TopologyWarning::DanglingDownstream {
                            node: group.node.clone(),
                            actor: actor.id,
                            downstream,
                        });
                    }
                }
            }
        }

        // Phase 3: fragments.
        let fragments = if fragments.is_empty() {
            derive_fragments(&actor_groups)
        } else {
            let mut seen = BTreeSet::new();
            for fragment in &fragments {
                if !seen.insert(fragment.id) {
                    return Err(ShapeError::DuplicateFragment {
                        fragment: fragment.id,
                    });
                }
                for &actor in &fragment.actor_ids {
                    match actor_fragments.get(&actor).map(Vec::as_slice) {
                        None => {
                            warnings.push(TopologyWarning::MissingFragmentMember {
                                fragment: fragment.id,
                                actor,
                            })
                        }
                        Some(declared) if !declared.contains(&fragment.id) => {
                            warnings.push(TopologyWarning::FragmentMismatch {
                                actor,
                                listed_in: fragment.id,
                                declared: declared[0],
                            })
                        }
                        Some(_) => {}
                    }
                }
            }
            fragments
        };

        // Phase 4: views.
        let known_fragments: BTreeSet<u32> = fragments
            .iter()
            .map(|f| f.id)
            .chain(actor_fragments.values().flatten().copied())
            .collect();
        let mut views = BTreeSet::new();
        for view in &materialized_views {
            if !views.insert(view.id.as_str()) {
                return Err(ShapeError::DuplicateView {
                    view: view.id.clone(),
                });
            }
            for &fragment in &view.fragment_ids {
                if !known_fragments.contains(&fragment) {
                    warnings.push(TopologyWarning::UnknownViewFragment {
                        view: view.id.clone(),
                        fragment,
                    });
                }
            }
        }

        for warning in &warnings {
            tracing::warn!(%warning, "topology data-quality problem");
        }

        Ok(Snapshot {
            actor_groups,
            fragments,
            materialized_views,
            warnings,
        })
    }

    pub fn actor_groups(&self) -> &[ActorGroup] {
        &self.actor_groups
    }

    pub fn fragments(&self) -> &[Fragment] {
        &self.fragments
    }

    pub fn materialized_views(&self) -> &[MaterializedView] {
        &self.materialized_views
    }

    pub fn warnings(&self) -> &[TopologyWarning] {
        &self.warnings
    }

    /// Hand the collections over to the page state in one move.
    pub fn into_parts(self) -> (Vec<ActorGroup>, Vec<MaterializedView>, Vec<TopologyWarning>) {
        (self.actor_groups, self.materialized_views, self.warnings)
    }

    /// True when there is something worth drawing: at least one group, and
    /// the first group has at least one actor.
    pub fn is_renderable(&self) -> bool {
        is_renderable(&self.actor_groups)
    }

    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            nodes: self.actor_groups.len(),
            actors: self.actor_groups.iter().map(|g| g.actors.len()).sum(),
            edges: self.actor_groups.iter().map(ActorGroup::edge_count).sum(),
            fragments: self.fragments.len(),
            materialized_views: self.materialized_views.len(),
            warnings: self.warnings.len(),
        }
    }
}

/// Two-part emptiness check shared with the page controller. A first group
/// with zero actors counts as no data even if more groups follow.
pub fn is_renderable(actor_groups: &[ActorGroup]) -> bool {
    actor_groups
        .first()
        .map(|g| !g.actors.is_empty())
        .unwrap_or(false)
}

/// Group actors by fragment id, in first-seen order.
fn derive_fragments(actor_groups: &[ActorGroup]) -> Vec<Fragment> {
    let mut order: Vec<u32> = Vec::new();
    let mut members: BTreeMap<u32, Vec<u32>> = BTreeMap::new();
    for actor in actor_groups.iter().flat_map(|g| &g.actors) {
        let ids = members.entry(actor.fragment_id).or_insert_with(|| {
            order.push(actor.fragment_id);
            Vec::new()
        });
        ids.push(actor.id);
    }

    order
        .into_iter()
        .map(|id| Fragment {
            id,
            kind: String::new(),
            actor_ids: members.remove(&id).unwrap_or_default(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::actor::Actor;
    use pretty_assertions::assert_eq;

    fn actor(id: u32, downstream: &[u32], fragment_id: u32) -> Actor {
        Actor {
            id,
            downstream: downstream.to_vec(),
            fragment_id,
        }
    }

    fn group(node: &str, actors: Vec<Actor>) -> ActorGroup {
        ActorGroup {
            node: node.to_string(),
            actors,
        }
    }

    fn view(id: &str, fragment_ids: &[u32]) -> MaterializedView {
        MaterializedView {
            id: id.to_string(),
            name: id.to_string(),
            fragment_ids: fragment_ids.to_vec(),
        }
    }

    fn join_raw() -> RawTopology {
        RawTopology {
            actor_groups: vec![group(
                "n1",
                vec![actor(1, &[2], 10), actor(2, &[], 10)],
            )],
            fragments: vec![],
            materialized_views: vec![view("mv1", &[10])],
        }
    }

    #[test]
    fn consistent_snapshot_has_no_warnings() {
        let raw = join_raw();
        let snapshot = Snapshot::validate(raw.clone()).unwrap();
        assert!(snapshot.warnings().is_empty());
        assert_eq!(snapshot.actor_groups(), raw.actor_groups.as_slice());
        assert_eq!(
            snapshot.materialized_views(),
            raw.materialized_views.as_slice()
        );
        assert!(snapshot.is_renderable());
    }

    #[test]
    fn dangling_edges_are_flagged_not_dropped() {
        let raw = RawTopology {
            actor_groups: vec![
                group("n1", vec![actor(1, &[2, 99], 10)]),
                group("n2", vec![actor(2, &[], 11)]),
            ],
            ..Default::default()
        };
        let snapshot = Snapshot::validate(raw).unwrap();
        assert_eq!(
            snapshot.warnings(),
            &[TopologyWarning::DanglingDownstream {
                node: "n1".to_string(),
                actor: 1,
                downstream: 99,
            }]
        );
        // The edge stays in place for the consumer to draw (or not).
        assert_eq!(snapshot.actor_groups()[0].actors[0].downstream, vec![2, 99]);
    }

    #[test]
    fn cross_node_edges_resolve() {
        let raw = RawTopology {
            actor_groups: vec![
                group("n1", vec![actor(1, &[3], 10)]),
                group("n2", vec![actor(3, &[], 11)]),
            ],
            ..Default::default()
        };
        assert!(Snapshot::validate(raw).unwrap().warnings().is_empty());
    }

    #[test]
    fn duplicate_node_is_a_shape_error() {
        let raw = RawTopology {
            actor_groups: vec![group("n1", vec![]), group("n1", vec![])],
            ..Default::default()
        };
        assert_eq!(
            Snapshot::validate(raw),
            Err(ShapeError::DuplicateNode {
                node: "n1".to_string()
            })
        );
    }

    #[test]
    fn duplicate_actor_within_node_is_a_shape_error() {
        let raw = RawTopology {
            actor_groups: vec![group("n1", vec![actor(1, &[], 1), actor(1, &[], 1)])],
            ..Default::default()
        };
        assert_eq!(
            Snapshot::validate(raw),
            Err(ShapeError::DuplicateActor {
                node: "n1".to_string(),
                actor: 1
            })
        );
    }

    #[test]
    fn same_actor_id_on_different_nodes_is_allowed() {
        let raw = RawTopology {
            actor_groups: vec![
                group("n1", vec![actor(1, &[], 1)]),
                group("n2", vec![actor(1, &[], 1)]),
            ],
            ..Default::default()
        };
        assert!(Snapshot::validate(raw).is_ok());
    }

    #[test]
    fn blank_node_is_a_shape_error() {
        let raw = RawTopology {
            actor_groups: vec![group(" ", vec![])],
            ..Default::default()
        };
        assert_eq!(
            Snapshot::validate(raw),
            Err(ShapeError::BlankNode { index: 0 })
        );
    }

    #[test]
    fn fragments_are_derived_in_first_seen_order() {
        let raw = RawTopology {
            actor_groups: vec![
                group("n1", vec![actor(5, &[1], 20), actor(6, &[2], 20)]),
                group("n2", vec![actor(1, &[], 10), actor(2, &[], 10), actor(7, &[], 20)]),
            ],
            ..Default::default()
        };
        let snapshot = Snapshot::validate(raw).unwrap();
        assert_eq!(
            snapshot.fragments(),
            &[
                Fragment {
                    id: 20,
                    kind: String::new(),
                    actor_ids: vec![5, 6, 7],
                },
                Fragment {
                    id: 10,
                    kind: String::new(),
                    actor_ids: vec![1, 2],
                },
            ]
        );
    }

    #[test]
    fn fragment_listing_is_cross_checked() {
        let mut raw = join_raw();
        raw.fragments = vec![
            Fragment {
                id: 10,
                kind: "HashJoin".to_string(),
                actor_ids: vec![1, 42],
            },
            Fragment {
                id: 11,
                kind: "Materialize".to_string(),
                actor_ids: vec![2],
            },
        ];
        let snapshot = Snapshot::validate(raw).unwrap();
        assert_eq!(
            snapshot.warnings(),
            &[
                TopologyWarning::MissingFragmentMember {
                    fragment: 10,
                    actor: 42
                },
                TopologyWarning::FragmentMismatch {
                    actor: 2,
                    listed_in: 11,
                    declared: 10
                },
            ]
        );
        assert_eq!(snapshot.fragments()[0].kind, "HashJoin");
    }

    #[test]
    fn reused_actor_id_matches_any_declared_fragment() {
        let raw = RawTopology {
            actor_groups: vec![
                group("n1", vec![actor(1, &[], 10)]),
                group("n2", vec![actor(1, &[], 11)]),
            ],
            fragments: vec![
                Fragment {
                    id: 10,
                    kind: String::new(),
                    actor_ids: vec![1],
                },
                Fragment {
                    id: 11,
                    kind: String::new(),
                    actor_ids: vec![1],
                },
                Fragment {
                    id: 12,
                    kind: String::new(),
                    actor_ids: vec![1],
                },
            ],
            materialized_views: vec![],
        };
        let snapshot = Snapshot::validate(raw).unwrap();
        assert_eq!(
            snapshot.warnings(),
            &[TopologyWarning::FragmentMismatch {
                actor: 1,
                listed_in: 12,
                declared: 10
            }]
        );
    }

    #[test]
    fn duplicate_fragment_is_a_shape_error() {
        let mut raw = join_raw();
        let f = Fragment {
            id: 10,
            kind: String::new(),
            actor_ids: vec![],
        };
        raw.fragments = vec![f.clone(), f];
        assert_eq!(
            Snapshot::validate(raw),
            Err(ShapeError::DuplicateFragment { fragment: 10 })
        );
    }

    #[test]
    fn views_with_unknown_fragments_are_flagged() {
        let mut raw = join_raw();
        raw.materialized_views = vec![view("mv1", &[10, 77])];
        let snapshot = Snapshot::validate(raw).unwrap();
        assert_eq!(
            snapshot.warnings(),
            &[TopologyWarning::UnknownViewFragment {
                view: "mv1".to_string(),
                fragment: 77
            }]
        );
    }

    #[test]
    fn duplicate_view_is_a_shape_error() {
        let mut raw = join_raw();
        raw.materialized_views = vec![view("mv1", &[]), view("mv1", &[])];
        assert!(matches!(
            Snapshot::validate(raw),
            Err(ShapeError::DuplicateView { .. })
        ));
    }

    #[test]
    fn validation_is_idempotent() {
        let a = Snapshot::validate(join_raw()).unwrap();
        let b = Snapshot::validate(join_raw()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn first_group_without_actors_is_not_renderable() {
        assert!(!is_renderable(&[]));
        assert!(!is_renderable(&[group("n1", vec![])]));
        assert!(!is_renderable(&[
            group("n1", vec![]),
            group("n2", vec![actor(1, &[], 1)])
        ]));
        assert!(is_renderable(&[group("n1", vec![actor(1, &[], 1)])]));
    }

    #[test]
    fn summary_counts() {
        let snapshot = Snapshot::validate(join_raw()).unwrap();
        assert_eq!(
            snapshot.summary(),
            SnapshotSummary {
                nodes: 1,
                actors: 2,
                edges: 1,
                fragments: 1,
                materialized_views: 1,
                warnings: 0,
            }
        );
    }
}
