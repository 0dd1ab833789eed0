// The rule table. A rule consumes the two nodes of an active pair and only touches their ports, so
// rules on distinct cuts never interfere. Annihilation leaves bridge ports behind instead of
// reaching into the neighbours; chain compaction fuses those away afterwards.

use log::trace;
use rustc_hash::FxHashSet;

use super::arena::{EdgeId, NodeId, PortId};
use super::core::{PortKind, Slot, Symbol};
use super::session::Session;

impl Session {
  // Consumes the active pair on `edge` and returns the compacted edges that may now be active.
  pub fn reduce_active_pair(&mut self, edge: EdgeId) -> Vec<EdgeId> {
    let candidates = self.rewrite(edge);
    self.compact(candidates)
  }

  // Fires the rule for an active pair without compacting.
  pub(crate) fn rewrite(&mut self, edge: EdgeId) -> Vec<EdgeId> {
    debug_assert!(self.net.is_active_pair(edge));
    let [a, b] = self.net.edges[edge].ends;
    let (Some((x, _)), Some((y, _))) = (self.net.owner(a), self.net.owner(b)) else {
      return Vec::new();
    };
    let (sx, sy) = (self.net.symbol(x), self.net.symbol(y));
    trace!("rewrite {:?}:{} ~ {:?}:{}", x, sx.tag(), y, sy.tag());
    self.stats.rules += 1;
    let candidates = match (sx, sy) {
      (Symbol::Eraser, Symbol::Eraser) => {
        self.stats.erasures += 1;
        Vec::new()
      }
      _ if sx == sy => self.annihilate(x, y),
      (Symbol::Eraser, _) => self.erase(y),
      (_, Symbol::Eraser) => self.erase(x),
      _ => self.commute(x, y),
    };
    self.net.free_node(x);
    self.net.free_node(y);
    candidates
  }

  fn annihilate(&mut self, x: NodeId, y: NodeId) -> Vec<EdgeId> {
    self.stats.annihilations += 1;
    if self.net.symbol(x) == Symbol::MarkedDuplicator {
      self.pending.remove(&x);
      self.pending.remove(&y);
    }
    let [xl, xr] = self.net.aux(x);
    let [yl, yr] = self.net.aux(y);
    self.net.bridge(xl, yl);
    self.net.bridge(xr, yr);
    self.outer_edges(&[xl, xr])
  }

  // Replaces `node` by two erasers sitting on its auxiliary wires.
  fn erase(&mut self, node: NodeId) -> Vec<EdgeId> {
    self.stats.erasures += 1;
    self.pending.remove(&node);
    let aux = self.net.aux(node);
    for port in aux.iter() {
      let eraser = self.net.new_node(Symbol::Eraser);
      self.net.adopt(eraser, Slot::Principal, *port);
    }
    self.outer_edges(&aux)
  }

  // Lets two different binary nodes pass through each other. Each node is copied once per
  // auxiliary port of the other, and the four copies are wired into a square.
  fn commute(&mut self, x: NodeId, y: NodeId) -> Vec<EdgeId> {
    self.stats.commutations += 1;
    let (sx, sy) = (self.net.symbol(x), self.net.symbol(y));
    let [xl, xr] = self.net.aux(x);
    let [yl, yr] = self.net.aux(y);
    let x_name = self.net.ports[xl].name.clone();
    let y_name = self.net.ports[yl].name.clone();

    let y_copy = copied_symbol(sy, sx);
    let x_copy = copied_symbol(sx, sy);
    let top_l = self.spawn(y_copy, xr);
    let top_r = self.spawn(y_copy, xl);
    let bot_l = self.spawn(x_copy, yl);
    let bot_r = self.spawn(x_copy, yr);

    let [top_l_l, top_l_r] = self.net.aux(top_l);
    let [top_r_l, top_r_r] = self.net.aux(top_r);
    let [bot_l_l, bot_l_r] = self.net.aux(bot_l);
    let [bot_r_l, bot_r_r] = self.net.aux(bot_r);
    self.net.connect(top_l_l, bot_l_r);
    self.net.connect(top_l_r, bot_r_r);
    self.net.connect(top_r_l, bot_l_l);
    self.net.connect(top_r_r, bot_r_l);
    self.net.ports[top_l_l].name = y_name.clone();
    self.net.ports[top_r_l].name = y_name;
    self.net.ports[bot_l_l].name = x_name.clone();
    self.net.ports[bot_r_l].name = x_name;

    self.pending.remove(&x);
    self.pending.remove(&y);
    for node in [top_l, top_r, bot_l, bot_r].iter() {
      if self.net.symbol(*node) == Symbol::MarkedDuplicator {
        self.pending.insert(*node);
      }
    }
    self.outer_edges(&[xl, xr, yl, yr])
  }

  // A new node of the given symbol whose principal port is an existing port.
  fn spawn(&mut self, symbol: Symbol, principal: PortId) -> NodeId {
    let node = self.net.new_node(symbol);
    self.net.adopt(node, Slot::Principal, principal);
    node
  }

  fn outer_edges(&self, ports: &[PortId]) -> Vec<EdgeId> {
    ports.iter().filter_map(|port| self.net.ports.get(*port).and_then(|port| port.edge)).collect()
  }

  // Fuses every chain of bridge ports reachable from the candidates into a single edge between
  // the real ports at both ends. Returns the surviving edges.
  pub(crate) fn compact(&mut self, candidates: Vec<EdgeId>) -> Vec<EdgeId> {
    let pool: FxHashSet<EdgeId> = candidates.iter().copied().collect();
    let mut seen = FxHashSet::default();
    let mut fused = Vec::with_capacity(candidates.len());
    for edge in candidates {
      if seen.contains(&edge) || !self.net.edges.contains(edge) {
        continue;
      }
      let [a, b] = self.net.edges[edge].ends;
      let mut chain = Chain::default();
      let ends = (
        self.extend(edge, b, &pool, &mut seen, &mut chain),
        self.extend(edge, a, &pool, &mut seen, &mut chain),
      );
      for link in chain.edges {
        self.net.edges.remove(link);
      }
      for port in chain.ports {
        self.net.ports.remove(port);
      }
      match ends {
        (Some(a), Some(b)) => {
          self.net.edges[edge].ends = [a, b];
          self.net.ports[a].edge = Some(edge);
          self.net.ports[b].edge = Some(edge);
          fused.push(edge);
        }
        // A closed ring of bridges is garbage.
        _ => self.net.drop_edge(edge),
      }
    }
    fused
  }

  // Walks from `from` across `edge` and through any bridges beyond it, returning the first real
  // port. None if the chain closes on itself or ends in a loose bridge.
  fn extend(&self, start: EdgeId, from: PortId, pool: &FxHashSet<EdgeId>, seen: &mut FxHashSet<EdgeId>, chain: &mut Chain) -> Option<PortId> {
    let mut edge = start;
    let mut from = from;
    loop {
      if pool.contains(&edge) {
        seen.insert(edge);
      }
      let to = self.net.other(edge, from);
      let port = &self.net.ports[to];
      if port.kind != PortKind::Bridge {
        return Some(to);
      }
      let next = (if port.edge == Some(edge) { port.bridge } else { port.edge })?;
      if next == start {
        return None;
      }
      chain.ports.push(to);
      chain.edges.push(next);
      from = to;
      edge = next;
    }
  }
}

#[derive(Default)]
struct Chain {
  ports: Vec<PortId>,
  edges: Vec<EdgeId>,
}

// The symbol a node takes when it is copied by crossing a node of the other symbol. A plain
// duplicator crossing a constructor starts copying under a binder, so its copies come out marked.
fn copied_symbol(symbol: Symbol, crossing: Symbol) -> Symbol {
  match (symbol, crossing) {
    (Symbol::Duplicator, Symbol::Constructor) => Symbol::MarkedDuplicator,
    _ => symbol,
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Config;
  use crate::inet::core::PortKind;

  fn free(session: &mut Session, name: &str) -> PortId {
    session.net.new_port(PortKind::Free, Some(name.to_string()))
  }

  fn principal(session: &Session, node: NodeId) -> PortId {
    session.net.port(node, Slot::Principal).unwrap()
  }

  // Two binary nodes in a cut with their auxiliary ports wired to free ports a, b, c, d.
  fn cut(session: &mut Session, sx: Symbol, sy: Symbol) -> (EdgeId, [PortId; 4]) {
    let x = session.net.new_node(sx);
    let y = session.net.new_node(sy);
    let outside = [free(session, "a"), free(session, "b"), free(session, "c"), free(session, "d")];
    let [xl, xr] = session.net.aux(x);
    let [yl, yr] = session.net.aux(y);
    session.net.connect(xl, outside[0]);
    session.net.connect(xr, outside[1]);
    session.net.connect(yl, outside[2]);
    session.net.connect(yr, outside[3]);
    let (px, py) = (principal(session, x), principal(session, y));
    (session.net.connect(px, py), outside)
  }

  #[test]
  fn annihilation_splices_left_to_left_and_right_to_right() {
    let mut session = Session::new(Config::default());
    let (edge, [a, b, c, d]) = cut(&mut session, Symbol::Constructor, Symbol::Constructor);
    let fresh = session.reduce_active_pair(edge);
    assert_eq!(session.net.linked(a), Some(c));
    assert_eq!(session.net.linked(b), Some(d));
    assert_eq!(fresh.len(), 2);
    assert!(session.net.nodes.is_empty());
    assert_eq!(session.net.edges.len(), 2);
    assert_eq!(session.net.ports.len(), 5);
  }

  #[test]
  fn annihilating_marked_duplicators_leaves_the_pending_set() {
    let mut session = Session::new(Config::default());
    let (edge, _) = cut(&mut session, Symbol::MarkedDuplicator, Symbol::MarkedDuplicator);
    let [a, b] = session.net.edges[edge].ends;
    let x = session.net.owner(a).unwrap().0;
    let y = session.net.owner(b).unwrap().0;
    session.pending.insert(x);
    session.pending.insert(y);
    session.reduce_active_pair(edge);
    assert_eq!(session.pending_count(), 0);
  }

  #[test]
  fn erasure_puts_erasers_on_both_sides() {
    let mut session = Session::new(Config::default());
    let era = session.net.new_node(Symbol::Eraser);
    let (_, [a, b, _, _]) = cut(&mut session, Symbol::Constructor, Symbol::Constructor);
    let node = session.net.enter(a).unwrap().0;
    let (pe, pn) = (principal(&session, era), principal(&session, node));
    let edge = session.net.connect(pe, pn);
    session.reduce_active_pair(edge);
    for port in [a, b].iter() {
      let (eraser, slot) = session.net.enter(*port).unwrap();
      assert_eq!(slot, Slot::Principal);
      assert_eq!(session.net.symbol(eraser), Symbol::Eraser);
    }
    assert_eq!(session.stats.erasures, 1);
  }

  #[test]
  fn duplicator_crossing_a_constructor_yields_marked_copies() {
    let mut session = Session::new(Config::default());
    let (edge, [a, b, c, d]) = cut(&mut session, Symbol::Duplicator, Symbol::Constructor);
    let fresh = session.reduce_active_pair(edge);
    assert_eq!(fresh.len(), 4);
    // a and b sat on the duplicator, so they now face constructor copies.
    for port in [a, b].iter() {
      let (node, slot) = session.net.enter(*port).unwrap();
      assert_eq!((session.net.symbol(node), slot), (Symbol::Constructor, Slot::Principal));
    }
    for port in [c, d].iter() {
      let (node, slot) = session.net.enter(*port).unwrap();
      assert_eq!((session.net.symbol(node), slot), (Symbol::MarkedDuplicator, Slot::Principal));
      assert!(session.is_pending(node));
    }
    assert_eq!(session.pending_count(), 2);
    assert_eq!(session.net.nodes.len(), 4);
  }

  #[test]
  fn constructor_copies_keep_the_binder_name() {
    let mut session = Session::new(Config::default());
    let (edge, [a, b, _, _]) = cut(&mut session, Symbol::Constructor, Symbol::MarkedDuplicator);
    let [p, _] = session.net.edges[edge].ends;
    let lam = session.net.owner(p).unwrap().0;
    let left = session.net.aux(lam)[0];
    session.net.detach(left);
    session.net.ports[left].name = Some("f".to_string());
    session.reduce_active_pair(edge);
    // The marked duplicator copies now sit where the lambda's ports were.
    let (copy, _) = session.net.enter(b).unwrap();
    assert_eq!(session.net.symbol(copy), Symbol::MarkedDuplicator);
    let lambdas: Vec<_> = session.net.nodes.iter().filter(|(node, _)| session.net.is_lambda(*node)).collect();
    assert_eq!(lambdas.len(), 2);
    assert!(session.net.linked(a).is_none());
  }

  #[test]
  fn marked_duplicator_and_plain_duplicator_swap_symbols() {
    let mut session = Session::new(Config::default());
    let (edge, [a, _, c, _]) = cut(&mut session, Symbol::MarkedDuplicator, Symbol::Duplicator);
    let [p, _] = session.net.edges[edge].ends;
    session.pending.insert(session.net.owner(p).unwrap().0);
    session.reduce_active_pair(edge);
    assert_eq!(session.net.symbol(session.net.enter(a).unwrap().0), Symbol::Duplicator);
    assert_eq!(session.net.symbol(session.net.enter(c).unwrap().0), Symbol::MarkedDuplicator);
    assert_eq!(session.pending_count(), 2);
  }

  #[test]
  fn compaction_walks_through_consecutive_bridges() {
    let mut session = Session::new(Config::default());
    // Two annihilations in a row: a - [x ~ y] - [z ~ w] - c on the left, b ... d on the right.
    let x = session.net.new_node(Symbol::Constructor);
    let y = session.net.new_node(Symbol::Constructor);
    let z = session.net.new_node(Symbol::Constructor);
    let w = session.net.new_node(Symbol::Constructor);
    let outside = [free(&mut session, "a"), free(&mut session, "b"), free(&mut session, "c"), free(&mut session, "d")];
    let [a, b, c, d] = outside;
    let [xl, xr] = session.net.aux(x);
    let [yl, yr] = session.net.aux(y);
    let [zl, zr] = session.net.aux(z);
    let [wl, wr] = session.net.aux(w);
    session.net.connect(a, xl);
    session.net.connect(yl, zl);
    session.net.connect(wl, c);
    session.net.connect(b, xr);
    session.net.connect(yr, zr);
    session.net.connect(wr, d);
    let (px, py) = (principal(&session, x), principal(&session, y));
    let (pz, pw) = (principal(&session, z), principal(&session, w));
    let first = session.net.connect(px, py);
    let second = session.net.connect(pz, pw);
    let mut candidates = session.rewrite(first);
    candidates.extend(session.rewrite(second));
    let fused = session.compact(candidates);
    assert_eq!(fused.len(), 2);
    assert_eq!(session.net.linked(a), Some(c));
    assert_eq!(session.net.linked(b), Some(d));
    assert!(session.net.ports.iter().all(|(_, port)| port.kind != PortKind::Bridge));
    assert_eq!(session.net.edges.len(), 2);
  }

  #[test]
  fn a_ring_of_bridges_is_dropped() {
    let mut session = Session::new(Config::default());
    let (edge, [a, _, c, _]) = cut(&mut session, Symbol::Constructor, Symbol::Constructor);
    // Tie the right ports of both nodes to each other.
    let [p, q] = session.net.edges[edge].ends;
    let (x, y) = (session.net.owner(p).unwrap().0, session.net.owner(q).unwrap().0);
    let (xr, yr) = (session.net.aux(x)[1], session.net.aux(y)[1]);
    session.net.connect(xr, yr);
    session.reduce_active_pair(edge);
    assert_eq!(session.net.linked(a), Some(c));
    assert!(session.net.ports.iter().all(|(_, port)| port.kind != PortKind::Bridge));
    assert_eq!(session.net.edges.len(), 1);
  }
}
