// The graph substrate: nodes with up to three labelled ports, and edges joining ports pairwise.
// Everything lives in generational arenas, so a handle to something a rewrite consumed is detected
// instead of silently pointing at whatever reused the slot.

use std::mem;

use super::arena::{Arena, EdgeId, NodeId, PortId};
use crate::term::Term;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Symbol {
  Constructor,
  Eraser,
  Duplicator,
  MarkedDuplicator,
}

impl Symbol {
  pub fn is_duplicator(self) -> bool {
    matches!(self, Symbol::Duplicator | Symbol::MarkedDuplicator)
  }

  pub fn arity(self) -> usize {
    match self {
      Symbol::Eraser => 1,
      _ => 3,
    }
  }

  pub fn tag(self) -> &'static str {
    match self {
      Symbol::Constructor => "CON",
      Symbol::Eraser => "ERA",
      Symbol::Duplicator => "DUP",
      Symbol::MarkedDuplicator => "DUP'",
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Slot {
  Principal,
  Left,
  Right,
}

impl Slot {
  pub const ALL: [Slot; 3] = [Slot::Principal, Slot::Left, Slot::Right];

  pub fn index(self) -> usize {
    match self {
      Slot::Principal => 0,
      Slot::Left => 1,
      Slot::Right => 2,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PortKind {
  // Belongs to a node.
  Cell(NodeId, Slot),
  // One occurrence of a free variable.
  Free,
  // The interface between the net and the outside world.
  Boundary,
  // Left behind by an annihilation. Joins two edges until chain compaction fuses them.
  Bridge,
}

#[derive(Clone, Debug)]
pub struct Port {
  pub kind: PortKind,
  pub edge: Option<EdgeId>,
  // Second edge of a bridge port.
  pub bridge: Option<EdgeId>,
  pub name: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Edge {
  pub ends: [PortId; 2],
}

// Decode-time cache for the term shared by both outputs of a duplicator. The first visit fills
// it, the second one takes it back out.
#[derive(Clone, Debug, Default)]
pub enum Memo {
  #[default]
  Empty,
  Computed(Term),
}

impl Memo {
  pub fn store(&mut self, term: Term) {
    assert!(matches!(self, Memo::Empty), "memo slot filled twice");
    *self = Memo::Computed(term);
  }

  pub fn take(&mut self) -> Option<Term> {
    match mem::take(self) {
      Memo::Computed(term) => Some(term),
      Memo::Empty => None,
    }
  }
}

#[derive(Clone, Debug)]
pub struct Node {
  pub symbol: Symbol,
  pub ports: [Option<PortId>; 3],
  pub memo: Memo,
}

#[derive(Default)]
pub struct INet {
  pub nodes: Arena<NodeId, Node>,
  pub ports: Arena<PortId, Port>,
  pub edges: Arena<EdgeId, Edge>,
}

impl INet {
  pub fn new() -> Self {
    Self::default()
  }

  // Allocates a node together with its ports.
  pub fn new_node(&mut self, symbol: Symbol) -> NodeId {
    let node = self.nodes.insert(Node { symbol, ports: [None; 3], memo: Memo::Empty });
    for slot in Slot::ALL.iter().take(symbol.arity()) {
      let port = self.new_port(PortKind::Cell(node, *slot), None);
      self.nodes[node].ports[slot.index()] = Some(port);
    }
    node
  }

  // Allocates a port that belongs to no node.
  pub fn new_port(&mut self, kind: PortKind, name: Option<String>) -> PortId {
    self.ports.insert(Port { kind, edge: None, bridge: None, name })
  }

  pub fn port(&self, node: NodeId, slot: Slot) -> Option<PortId> {
    self.nodes.get(node).and_then(|node| node.ports[slot.index()])
  }

  // Both auxiliary ports of a binary node. Panics on an eraser, like indexing past the end would.
  pub fn aux(&self, node: NodeId) -> [PortId; 2] {
    match self.nodes[node].ports {
      [_, Some(left), Some(right)] => [left, right],
      _ => panic!("{:?} has no auxiliary ports", node),
    }
  }

  pub fn symbol(&self, node: NodeId) -> Symbol {
    self.nodes[node].symbol
  }

  pub fn owner(&self, port: PortId) -> Option<(NodeId, Slot)> {
    match self.ports.get(port)?.kind {
      PortKind::Cell(node, slot) => Some((node, slot)),
      _ => None,
    }
  }

  pub fn name(&self, port: PortId) -> Option<&str> {
    self.ports.get(port).and_then(|port| port.name.as_deref())
  }

  // The port on the other side of an edge.
  pub fn other(&self, edge: EdgeId, port: PortId) -> PortId {
    let [a, b] = self.edges[edge].ends;
    if a == port {
      b
    } else {
      a
    }
  }

  // The port this one is wired to, if any.
  pub fn linked(&self, port: PortId) -> Option<PortId> {
    let edge = self.ports.get(port)?.edge?;
    self.edges.get(edge)?;
    Some(self.other(edge, port))
  }

  // The node on the other side of a port, with the slot it is entered through.
  pub fn enter(&self, port: PortId) -> Option<(NodeId, Slot)> {
    self.linked(port).and_then(|other| self.owner(other))
  }

  // Wires two ports together, dropping whatever edges they had before.
  pub fn connect(&mut self, a: PortId, b: PortId) -> EdgeId {
    self.detach(a);
    self.detach(b);
    let edge = self.edges.insert(Edge { ends: [a, b] });
    self.ports[a].edge = Some(edge);
    self.ports[b].edge = Some(edge);
    edge
  }

  // Removes the main edge of a port, clearing the reference held by the far end as well.
  pub fn detach(&mut self, port: PortId) {
    if let Some(edge) = self.ports.get_mut(port).and_then(|port| port.edge.take()) {
      self.drop_edge(edge);
    }
  }

  // Removes an edge and every port reference to it.
  pub fn drop_edge(&mut self, edge: EdgeId) {
    if let Some(Edge { ends }) = self.edges.remove(edge) {
      for end in ends.iter() {
        if let Some(port) = self.ports.get_mut(*end) {
          if port.edge == Some(edge) {
            port.edge = None;
          }
          if port.bridge == Some(edge) {
            port.bridge = None;
          }
        }
      }
    }
  }

  pub fn is_active_pair(&self, edge: EdgeId) -> bool {
    match self.edges.get(edge) {
      Some(Edge { ends: [a, b] }) => {
        matches!(self.owner(*a), Some((_, Slot::Principal))) && matches!(self.owner(*b), Some((_, Slot::Principal)))
      }
      None => false,
    }
  }

  // A constructor whose left port carries a binder name.
  pub fn is_lambda(&self, node: NodeId) -> bool {
    self.symbol(node) == Symbol::Constructor && self.port(node, Slot::Left).and_then(|port| self.name(port)).is_some()
  }

  pub fn is_application(&self, node: NodeId) -> bool {
    self.symbol(node) == Symbol::Constructor && !self.is_lambda(node)
  }

  // Moves an existing port onto a node, discarding the fresh port the node had in that slot.
  pub fn adopt(&mut self, node: NodeId, slot: Slot, port: PortId) {
    if let Some(fresh) = self.nodes[node].ports[slot.index()].replace(port) {
      self.detach(fresh);
      self.ports.remove(fresh);
    }
    let adopted = &mut self.ports[port];
    adopted.kind = PortKind::Cell(node, slot);
    if slot == Slot::Principal {
      adopted.name = None;
    }
  }

  // Detaches two ports from their nodes and joins them with an inner edge.
  pub fn bridge(&mut self, a: PortId, b: PortId) -> EdgeId {
    let edge = self.edges.insert(Edge { ends: [a, b] });
    for port in [a, b].iter() {
      let port = &mut self.ports[*port];
      port.kind = PortKind::Bridge;
      port.bridge = Some(edge);
    }
    edge
  }

  // Changes the symbol of a node. The ports move to a new node, so the old handle goes stale.
  pub fn relabel(&mut self, node: NodeId, symbol: Symbol) -> NodeId {
    let old = match self.nodes.remove(node) {
      Some(old) => old,
      None => panic!("stale handle {:?}", node),
    };
    let ports = old.ports;
    let fresh = self.nodes.insert(Node { symbol, ports, memo: Memo::Empty });
    for (slot, port) in Slot::ALL.iter().zip(ports.iter()) {
      if let Some(port) = port {
        self.ports[*port].kind = PortKind::Cell(fresh, *slot);
      }
    }
    fresh
  }

  // Releases a consumed node, along with the ports it still owns and their edges.
  pub fn free_node(&mut self, node: NodeId) {
    if let Some(old) = self.nodes.remove(node) {
      for (slot, port) in Slot::ALL.iter().zip(old.ports.iter()) {
        if let Some(port) = *port {
          if self.owner(port) == Some((node, *slot)) {
            self.detach(port);
            self.ports.remove(port);
          }
        }
      }
    }
  }
}
