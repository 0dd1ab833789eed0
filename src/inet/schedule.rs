// Resolution of marked duplicators. The cut rules alone cannot tell when a copy that started under
// a binder is finished, so marked duplicators left over once the queue runs dry are settled here:
// unmarked when they face their binder or a free variable, pushed through an application they are
// stuck on, or used to mark the plain duplicator they run into.

use log::{debug, trace};

use super::arena::{NodeId, PortId};
use super::core::{Slot, Symbol};
use super::session::Session;
use crate::config::Strategy;

// What a marked duplicator should do next, judged by what its principal port faces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Resolution {
  // Nothing left to copy: turn it back into a plain duplicator.
  Settle,
  // Stuck on the result of an application: copy the application.
  Force,
  // Facing a plain duplicator: mark it.
  Mark(NodeId),
  Wait,
}

impl Session {
  // Reduces the net to normal form with the configured strategy.
  pub fn reduce(&mut self) {
    debug!("reducing with the {} strategy", self.config.strategy);
    match self.config.strategy {
      Strategy::Demand => self.reduce_demand(),
      Strategy::Bulk => self.reduce_bulk(),
    }
    debug!("done: {} rules, {} pending", self.stats.rules, self.pending.len());
  }

  pub fn reduce_demand(&mut self) {
    let root = self.root;
    self.demand(root);
  }

  // Reduces whatever sits behind `handle` far enough to read it.
  fn demand(&mut self, handle: PortId) {
    if !self.demanding.insert(handle) {
      return;
    }
    self.depth += 1;
    self.demand_at(handle);
    self.depth -= 1;
    self.demanding.remove(&handle);
  }

  fn demand_at(&mut self, handle: PortId) {
    loop {
      self.normalize();
      if self.pending.is_empty() {
        return;
      }
      let Some((top, slot)) = self.net.enter(handle) else {
        return;
      };
      match self.net.symbol(top) {
        Symbol::Constructor if slot == Slot::Principal => {
          if let Some(body) = self.net.port(top, Slot::Right) {
            self.demand(body);
          }
        }
        Symbol::Constructor if self.net.is_application(top) => {
          let function = self.net.port(top, Slot::Principal);
          let argument = self.net.port(top, Slot::Left);
          if let Some(function) = function {
            self.demand(function);
          }
          // An argument only matters here when a marked duplicator is waiting on it.
          if self.is_marked_principal(handle) && self.net.enter(handle).map(|(_, slot)| slot) == Some(Slot::Left) {
            if let Some(argument) = argument {
              self.demand(argument);
            }
          }
        }
        Symbol::Duplicator => {
          if let Some(principal) = self.net.port(top, Slot::Principal) {
            self.demand(principal);
          }
        }
        Symbol::MarkedDuplicator => {
          if self.resolve(handle, top) {
            continue;
          }
        }
        _ => {}
      }
      return;
    }
  }

  // Settles the marked duplicator behind `handle`. Returns true when `handle` must be demanded
  // again because another duplicator got marked.
  fn resolve(&mut self, handle: PortId, top: NodeId) -> bool {
    if let Some(principal) = self.net.port(top, Slot::Principal) {
      self.demand(principal);
    }
    if !self.is_marked(top) {
      return false;
    }
    match self.classify(top) {
      Resolution::Settle => self.unmark(top),
      Resolution::Force => {
        if self.force_duplication(top) {
          self.demand_linked(handle, Slot::Principal);
          self.demand_linked(handle, Slot::Left);
        }
      }
      Resolution::Mark(dup) => {
        self.mark(dup);
        return true;
      }
      Resolution::Wait => {}
    }
    false
  }

  // Demands a port of the node currently wired to `handle`.
  fn demand_linked(&mut self, handle: PortId, slot: Slot) {
    let port = self.net.enter(handle).and_then(|(node, _)| self.net.port(node, slot));
    if let Some(port) = port {
      self.demand(port);
    }
  }

  fn is_marked(&self, node: NodeId) -> bool {
    self.net.nodes.get(node).map_or(false, |node| node.symbol == Symbol::MarkedDuplicator)
  }

  fn is_marked_principal(&self, port: PortId) -> bool {
    matches!(self.net.owner(port), Some((node, Slot::Principal)) if self.is_marked(node))
  }

  fn classify(&self, node: NodeId) -> Resolution {
    let facing = self.net.port(node, Slot::Principal).and_then(|port| self.net.enter(port));
    match facing {
      None => Resolution::Settle,
      Some((next, _)) if self.net.is_lambda(next) => Resolution::Settle,
      Some((next, Slot::Right)) if self.net.is_application(next) => Resolution::Force,
      Some((next, _)) if self.net.symbol(next) == Symbol::Duplicator => Resolution::Mark(next),
      _ => Resolution::Wait,
    }
  }

  // Copies the application whose result a marked duplicator is stuck on. The copies take over the
  // duplicator's outputs, and two new marked duplicators share the function and the argument.
  pub(crate) fn force_duplication(&mut self, dup: NodeId) -> bool {
    let Some((app, Slot::Right)) = self.net.port(dup, Slot::Principal).and_then(|port| self.net.enter(port)) else {
      return false;
    };
    let [dup_l, dup_r] = self.net.aux(dup);
    let [app_l, _] = self.net.aux(app);
    let app_p = self.net.port(app, Slot::Principal);
    let outputs = (self.net.linked(dup_l), self.net.linked(dup_r));
    let inputs = (app_p.and_then(|port| self.net.linked(port)), self.net.linked(app_l));
    let ((Some(out_l), Some(out_r)), (Some(function), Some(argument))) = (outputs, inputs) else {
      return false;
    };
    trace!("force {:?} through {:?}", dup, app);
    self.stats.forced += 1;

    let gam_l = self.net.new_node(Symbol::Constructor);
    let gam_r = self.net.new_node(Symbol::Constructor);
    let del_l = self.net.new_node(Symbol::MarkedDuplicator);
    let del_r = self.net.new_node(Symbol::MarkedDuplicator);
    let [gam_l_l, gam_l_r] = self.net.aux(gam_l);
    let [gam_r_l, gam_r_r] = self.net.aux(gam_r);
    let [del_l_l, del_l_r] = self.net.aux(del_l);
    let [del_r_l, del_r_r] = self.net.aux(del_r);
    let principals = [gam_l, gam_r, del_l, del_r].map(|node| self.net.port(node, Slot::Principal));
    let [Some(gam_l_p), Some(gam_r_p), Some(del_l_p), Some(del_r_p)] = principals else {
      return false;
    };

    self.net.connect(gam_l_r, out_r);
    self.net.connect(gam_l_l, del_r_r);
    self.net.connect(gam_l_p, del_l_r);
    self.net.connect(gam_r_r, out_l);
    self.net.connect(gam_r_l, del_r_l);
    self.net.connect(gam_r_p, del_l_l);
    let function = self.net.connect(del_l_p, function);
    let argument = self.net.connect(del_r_p, argument);

    self.pending.remove(&dup);
    self.pending.insert(del_l);
    self.pending.insert(del_r);
    self.net.free_node(dup);
    self.net.free_node(app);
    self.enqueue_active(vec![function, argument]);
    true
  }

  // Turns a plain duplicator into a marked one.
  pub(crate) fn mark(&mut self, dup: NodeId) -> NodeId {
    trace!("mark {:?}", dup);
    self.stats.marked += 1;
    let marked = self.net.relabel(dup, Symbol::MarkedDuplicator);
    self.pending.insert(marked);
    marked
  }

  // Turns a marked duplicator back into a plain one, along with the marked duplicators hanging
  // off its outputs.
  pub(crate) fn unmark(&mut self, dup: NodeId) {
    let mut work = vec![dup];
    while let Some(node) = work.pop() {
      if !self.is_marked(node) {
        continue;
      }
      trace!("unmark {:?}", node);
      self.stats.unmarked += 1;
      self.pending.remove(&node);
      let plain = self.net.relabel(node, Symbol::Duplicator);
      for port in self.net.aux(plain).iter() {
        if let Some((next, _)) = self.net.enter(*port) {
          if self.is_marked(next) {
            work.push(next);
          }
        }
      }
    }
  }

  // Alternates full drains of the cut queue with one pass over the pending duplicators, until a
  // pass finds nothing to do.
  pub fn reduce_bulk(&mut self) {
    loop {
      self.drain_in_batches();
      self.stats.rounds += 1;
      self.collect_garbage();
      if !self.settle_pending() {
        return;
      }
    }
  }

  // Rewrites every queued cut as one batch, compacts once, and repeats while new cuts appear.
  fn drain_in_batches(&mut self) {
    while !self.cuts.is_empty() {
      let batch: Vec<_> = self.cuts.drain(..).collect();
      let mut candidates = Vec::new();
      for edge in batch {
        if self.net.is_active_pair(edge) {
          candidates.extend(self.rewrite(edge));
          self.since_sweep += 1;
        }
      }
      let fresh = self.compact(candidates);
      self.enqueue_active(fresh);
      if self.since_sweep >= self.config.gc_interval.get() {
        self.collect_garbage();
      }
    }
  }

  // One pass over the pending set. Forcing and marking come first; unmarking only happens in a
  // pass where neither applied. Returns whether anything changed.
  fn settle_pending(&mut self) -> bool {
    let snapshot: Vec<NodeId> = self.pending.iter().copied().collect();
    let mut progressed = false;
    let mut settled = Vec::new();
    for node in snapshot {
      if !self.is_marked(node) {
        continue;
      }
      match self.classify(node) {
        Resolution::Force => progressed |= self.force_duplication(node),
        Resolution::Mark(dup) => {
          self.mark(dup);
          progressed = true;
        }
        Resolution::Settle => settled.push(node),
        Resolution::Wait => {}
      }
    }
    if progressed {
      return true;
    }
    for node in settled {
      if self.is_marked(node) && self.classify(node) == Resolution::Settle {
        self.unmark(node);
        progressed = true;
      }
    }
    progressed
  }
}
