use log::debug;
use rustc_hash::FxHashSet;

use super::arena::NodeId;
use super::core::{Slot, Symbol};
use super::session::Session;

impl Session {
  // Drops every queued cut and pending duplicator that can no longer be reached from the root.
  pub fn collect_garbage(&mut self) {
    self.stats.sweeps += 1;
    self.since_sweep = 0;
    let before = (self.cuts.len(), self.pending.len());
    match self.net.enter(self.root) {
      None => {
        self.cuts.clear();
        self.pending.clear();
      }
      Some((first, _)) => {
        let live = self.reachable(first);
        let net = &self.net;
        self.cuts.retain(|edge| match net.edges.get(*edge) {
          Some(edge) => edge.ends.iter().any(|end| net.owner(*end).map_or(false, |(node, _)| live.contains(&node))),
          None => false,
        });
        self.pending.retain(|node| live.contains(node));
      }
    }
    debug!(
      "gc: dropped {} cuts and {} pending duplicators",
      before.0 - self.cuts.len(),
      before.1 - self.pending.len()
    );
  }

  // Nodes reachable from `first`. A plain duplicator is only followed through its principal port:
  // its outputs lead back into structure that is reached from its uses anyway.
  fn reachable(&self, first: NodeId) -> FxHashSet<NodeId> {
    let mut live = FxHashSet::default();
    let mut stack = vec![first];
    while let Some(node) = stack.pop() {
      if !live.insert(node) {
        continue;
      }
      let slots: &[Slot] = match self.net.symbol(node) {
        Symbol::Duplicator => &Slot::ALL[..1],
        _ => &Slot::ALL,
      };
      for slot in slots {
        let next = self.net.port(node, *slot).and_then(|port| self.net.enter(port));
        if let Some((next, _)) = next {
          if !live.contains(&next) {
            stack.push(next);
          }
        }
      }
    }
    live
  }
}

#[cfg(test)]
mod tests {
  use crate::config::Config;
  use crate::inet::Session;
  use crate::term::Term;

  fn omega() -> Term {
    let half = Term::lam("x", Term::app(Term::var("x"), Term::var("x")));
    Term::app(half.clone(), half)
  }

  #[test]
  fn sweep_clears_everything_when_the_root_is_a_free_variable() {
    let mut session = Session::new(Config::default());
    // (L x . y) omega: after one step the root is wired straight to `y`.
    session.encode(&Term::app(Term::lam("x", Term::var("y")), omega())).unwrap();
    session.run(2);
    session.collect_garbage();
    assert_eq!(session.cut_count(), 0);
    assert_eq!(session.pending_count(), 0);
    assert_eq!(session.stats().sweeps, 1);
  }

  #[test]
  fn sweep_keeps_reachable_cuts() {
    let mut session = Session::new(Config::default());
    session.encode(&omega()).unwrap();
    session.run(3);
    let queued = session.cut_count();
    assert!(queued > 0);
    session.collect_garbage();
    assert_eq!(session.cut_count(), queued);
  }

  #[test]
  fn unreachable_garbage_is_dropped_but_the_result_survives() {
    let mut session = Session::new(Config::default());
    // L b . (L c . b) (omega b): the argument of the inner redex is never needed.
    let term = Term::lam(
      "b",
      Term::app(Term::lam("c", Term::var("b")), Term::app(omega(), Term::var("b"))),
    );
    session.encode(&term).unwrap();
    session.run(50);
    session.collect_garbage();
    assert_eq!(session.cut_count(), 0);
    let result = session.decode().unwrap();
    assert!(result.alpha_eq(&Term::lam("b", Term::var("b"))));
  }
}
