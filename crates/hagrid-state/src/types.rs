//! Domain types held by the working set.
//!
//! Nodes, resources, and actions live in arenas owned by
//! [`WorkingSet`](crate::WorkingSet) and refer to each other through the
//! index newtypes below, never through references.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::{BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

use hagrid_core::names::{is_true_opt, task};

/// Index of a node in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub usize);

/// Index of a resource in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(pub usize);

/// Index of an action in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub usize);

/// Index of an ordering constraint in the working set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderingId(pub usize);

// ── Node ──────────────────────────────────────────────────────────

/// How a node joined the cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// Full cluster member.
    #[default]
    Cluster,
    /// Reached through a remote connection resource.
    Remote,
    /// Runs inside a container resource.
    Guest,
}

/// Whether a resource should be discovered (probed) on a node.
///
/// Ordered by strength: a stronger mode always replaces a weaker one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscoverMode {
    #[default]
    Always,
    Never,
    Exclusive,
}

/// A cluster node as seen by one planning cycle.
///
/// `weight` and `discover_mode` only carry meaning on per-resource copies
/// (a resource's allowed-node table or a ranking candidate list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub name: String,
    pub kind: NodeKind,
    pub online: bool,
    pub unclean: bool,
    pub standby: bool,
    pub maintenance: bool,
    pub shutdown: bool,
    /// Cleared when the administrator disabled resource discovery here.
    pub rsc_discovery_enabled: bool,
    /// Remote node whose connection resource failed beyond recovery.
    pub remote_connection_failed: bool,
    pub remote_requires_reset: bool,
    /// Container resource hosting a guest node.
    pub container: Option<ResourceId>,
    pub weight: i32,
    pub discover_mode: DiscoverMode,
    /// Remaining capacity per utilization attribute.
    pub utilization: BTreeMap<String, i64>,
    /// Resources already assigned to this node.
    pub num_resources: u32,
    pub attributes: BTreeMap<String, String>,
}

impl Node {
    /// A clean, online cluster node. The id is set when the node is added
    /// to a working set.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: NodeId(usize::MAX),
            name: name.into(),
            kind: NodeKind::Cluster,
            online: true,
            unclean: false,
            standby: false,
            maintenance: false,
            shutdown: false,
            rsc_discovery_enabled: true,
            remote_connection_failed: false,
            remote_requires_reset: false,
            container: None,
            weight: 0,
            discover_mode: DiscoverMode::Always,
            utilization: BTreeMap::new(),
            num_resources: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// True for remote and guest nodes.
    pub fn is_remote(&self) -> bool {
        self.kind != NodeKind::Cluster
    }

    pub fn is_guest(&self) -> bool {
        self.kind == NodeKind::Guest
    }
}

// ── Resource ──────────────────────────────────────────────────────

/// Structural kind of a resource.
///
/// The declaration order matters: anything above `Group` is a clone-like
/// collective whose children are per-node instances.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    #[default]
    Primitive,
    Group,
    Clone,
    Bundle,
}

impl Variant {
    pub fn is_collective(self) -> bool {
        self != Variant::Primitive
    }

    /// Clones and bundles.
    pub fn is_clone_like(self) -> bool {
        self > Variant::Group
    }
}

/// Role of a resource instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    #[default]
    Unknown,
    Stopped,
    Started,
    Unpromoted,
    Promoted,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
    pub id: ResourceId,
    pub name: String,
    pub variant: Variant,
    /// Agent class (`ocf`, `systemd`, `stonith`, ...).
    pub class: String,
    pub parent: Option<ResourceId>,
    pub children: Vec<ResourceId>,
    /// Resource this one runs inside of.
    pub container: Option<ResourceId>,
    pub meta: BTreeMap<String, String>,
    pub role: Role,
    pub next_role: Role,
    pub running_on: Vec<NodeId>,
    /// Nodes where the resource's state has already been determined.
    pub known_on: BTreeSet<NodeId>,
    /// Per-resource node copies carrying location scores.
    pub allowed_nodes: BTreeMap<NodeId, Node>,
    pub assigned_to: Option<NodeId>,
    /// Capacity consumed on the node the resource is assigned to.
    pub utilization: BTreeMap<String, i64>,
    pub orphan: bool,
    pub failed: bool,
    /// The resource is the connection for a remote node.
    pub is_remote_connection: bool,
    pub exclusive_discover: bool,
    pub actions: Vec<ActionId>,
}

impl Resource {
    pub fn new(name: impl Into<String>, variant: Variant) -> Self {
        Self {
            id: ResourceId(usize::MAX),
            name: name.into(),
            variant,
            class: "ocf".to_string(),
            parent: None,
            children: Vec::new(),
            container: None,
            meta: BTreeMap::new(),
            role: Role::Stopped,
            next_role: Role::Unknown,
            running_on: Vec::new(),
            known_on: BTreeSet::new(),
            allowed_nodes: BTreeMap::new(),
            assigned_to: None,
            utilization: BTreeMap::new(),
            orphan: false,
            failed: false,
            is_remote_connection: false,
            exclusive_discover: false,
            actions: Vec::new(),
        }
    }

    pub fn primitive(name: impl Into<String>) -> Self {
        Self::new(name, Variant::Primitive)
    }

    pub fn with_meta(mut self, key: &str, value: &str) -> Self {
        self.meta.insert(key.to_string(), value.to_string());
        self
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }

    /// Whether a boolean meta-attribute is set to a true value.
    pub fn meta_is_true(&self, key: &str) -> bool {
        is_true_opt(self.meta_value(key))
    }
}

// ── Action flags ──────────────────────────────────────────────────

/// Scheduling flags carried by an action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionFlags(u32);

impl ActionFlags {
    /// Synthetic action with no executor work (e.g. collective milestones).
    pub const PSEUDO: Self = Self(0x1);
    pub const RUNNABLE: Self = Self(0x2);
    pub const OPTIONAL: Self = Self(0x4);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn insert(&mut self, other: Self) {
        self.0 |= other.0;
    }

    pub fn remove(&mut self, other: Self) {
        self.0 &= !other.0;
    }
}

impl BitOr for ActionFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

// ── Ordering types ────────────────────────────────────────────────

/// Bit set describing how strictly a "first then" relation binds.
///
/// The bit values are part of the transition graph output and must stay
/// stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderType(u32);

impl OrderType {
    /// Disabled ordering: contributes no edges.
    pub const NONE: Self = Self(0x0);
    pub const OPTIONAL: Self = Self(0x1);
    /// Only applies when the first action's resource cannot migrate.
    pub const APPLY_FIRST_NON_MIGRATABLE: Self = Self(0x2);
    pub const IMPLIES_FIRST: Self = Self(0x10);
    /// A required first action makes the then action required too.
    pub const IMPLIES_THEN: Self = Self(0x20);
    /// The then action is runnable only if the first one is.
    pub const RUNNABLE_LEFT: Self = Self(0x100);
    pub const IMPLIES_THEN_ON_NODE: Self = Self(0x400);
    pub const RESTART: Self = Self(0x1000);
    /// Only link actions scheduled on the same node.
    pub const SAME_NODE: Self = Self(0x8000);
    pub const IMPLIES_FIRST_PRINTED: Self = Self(0x10000);
    pub const IMPLIES_THEN_PRINTED: Self = Self(0x20000);
    pub const LOAD: Self = Self(0x200000);
    pub const ANTI_COLOCATION: Self = Self(0x800000);

    const NAMES: [(&'static str, OrderType); 13] = [
        ("none", Self::NONE),
        ("optional", Self::OPTIONAL),
        ("apply-first-non-migratable", Self::APPLY_FIRST_NON_MIGRATABLE),
        ("implies-first", Self::IMPLIES_FIRST),
        ("implies-then", Self::IMPLIES_THEN),
        ("runnable-left", Self::RUNNABLE_LEFT),
        ("implies-then-on-node", Self::IMPLIES_THEN_ON_NODE),
        ("restart", Self::RESTART),
        ("same-node", Self::SAME_NODE),
        ("implies-first-printed", Self::IMPLIES_FIRST_PRINTED),
        ("implies-then-printed", Self::IMPLIES_THEN_PRINTED),
        ("load", Self::LOAD),
        ("anti-colocation", Self::ANTI_COLOCATION),
    ];

    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// All bits of `other` are set.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// At least one bit is shared with `other`.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// Look up a single type by its configuration name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, t)| *t)
    }

    /// Combine several named types; `None` if any name is unknown.
    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Option<Self> {
        names
            .iter()
            .try_fold(Self::NONE, |acc, n| Self::from_name(n.as_ref()).map(|t| acc | t))
    }
}

impl BitOr for OrderType {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for OrderType {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl fmt::Display for OrderType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#08x}", self.0)
    }
}

// ── Action ────────────────────────────────────────────────────────

/// One side of an ordering edge in an action's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionEdge {
    pub action: ActionId,
    pub kind: OrderType,
}

/// A scheduled action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub id: ActionId,
    /// `<rsc>_<task>_<interval>` for resource actions.
    pub key: String,
    pub task: String,
    pub interval_ms: u32,
    pub rsc: Option<ResourceId>,
    pub node: Option<NodeId>,
    pub flags: ActionFlags,
    pub meta: BTreeMap<String, String>,
    /// Actions that must happen after this one.
    pub after: Vec<ActionEdge>,
    /// Actions that must happen before this one.
    pub before: Vec<ActionEdge>,
}

impl Action {
    pub fn is_pseudo(&self) -> bool {
        self.flags.contains(ActionFlags::PSEUDO)
    }

    pub fn is_runnable(&self) -> bool {
        self.flags.contains(ActionFlags::RUNNABLE)
    }

    pub fn is_optional(&self) -> bool {
        self.flags.contains(ActionFlags::OPTIONAL)
    }

    /// A one-shot status check (monitor with interval 0).
    pub fn is_probe(&self) -> bool {
        self.task.eq_ignore_ascii_case(task::MONITOR) && self.interval_ms == 0
    }

    pub fn meta_value(&self, key: &str) -> Option<&str> {
        self.meta.get(key).map(String::as_str)
    }
}

// ── Constraints ───────────────────────────────────────────────────

/// One side of an ordering constraint.
///
/// Either an already-created action, or a resource plus an action key that
/// is matched against the resource's actions when the ordering is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSide {
    pub rsc: Option<ResourceId>,
    pub action: Option<ActionId>,
    /// Action key resolved lazily, e.g. `db_stop_0`.
    pub task: Option<String>,
}

impl OrderSide {
    pub fn action(rsc: Option<ResourceId>, action: ActionId) -> Self {
        Self {
            rsc,
            action: Some(action),
            task: None,
        }
    }

    pub fn task(rsc: Option<ResourceId>, key: impl Into<String>) -> Self {
        Self {
            rsc,
            action: None,
            task: Some(key.into()),
        }
    }

    /// True when the side names an action or a task to match.
    pub fn is_resolvable(&self) -> bool {
        self.action.is_some() || self.task.is_some()
    }
}

/// A "first then" ordering constraint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ordering {
    pub id: OrderingId,
    pub kind: OrderType,
    pub first: OrderSide,
    pub then: OrderSide,
}

/// A location score for one resource on one node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConstraint {
    pub id: String,
    pub rsc: ResourceId,
    pub node: NodeId,
    pub score: i32,
    pub discover_mode: DiscoverMode,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn variant_order_separates_clone_like() {
        assert!(!Variant::Primitive.is_collective());
        assert!(Variant::Group.is_collective());
        assert!(!Variant::Group.is_clone_like());
        assert!(Variant::Clone.is_clone_like());
        assert!(Variant::Bundle.is_clone_like());
    }

    #[test]
    fn discover_modes_strengthen() {
        assert!(DiscoverMode::Always < DiscoverMode::Never);
        assert!(DiscoverMode::Never < DiscoverMode::Exclusive);
    }

    #[test]
    fn order_type_names() {
        let t = OrderType::from_names(&["optional", "same-node"]).unwrap();
        assert!(t.contains(OrderType::OPTIONAL));
        assert!(t.contains(OrderType::SAME_NODE));
        assert!(!t.contains(OrderType::LOAD));
        assert!(OrderType::from_names(&["optional", "sometimes"]).is_none());
        assert!(OrderType::from_names::<&str>(&[]).unwrap().is_none());
    }

    #[test]
    fn order_type_intersection() {
        let t = OrderType::OPTIONAL | OrderType::RUNNABLE_LEFT;
        assert!(t.intersects(OrderType::OPTIONAL));
        assert!(!t.intersects(OrderType::IMPLIES_THEN));
        assert_eq!(t.to_string(), "0x000101");
    }

    #[test]
    fn action_flags() {
        let mut flags = ActionFlags::RUNNABLE | ActionFlags::OPTIONAL;
        assert!(flags.contains(ActionFlags::RUNNABLE));
        flags.remove(ActionFlags::OPTIONAL);
        assert!(!flags.contains(ActionFlags::OPTIONAL));
        flags.insert(ActionFlags::PSEUDO);
        assert_eq!(flags.bits(), 0x3);
    }

    #[test]
    fn meta_flags_are_parsed_as_booleans() {
        let rsc = Resource::primitive("db").with_meta("allow-unhealthy-nodes", "yes");
        assert!(rsc.meta_is_true("allow-unhealthy-nodes"));
        assert!(!rsc.meta_is_true("interleave"));
    }
}
