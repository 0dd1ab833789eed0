// A reduction session owns one net and all the bookkeeping of a single run: the cut queue, the set
// of pending marked duplicators and the free-variable table. Starting a new run means encoding a
// new term, which clears everything.

use std::collections::{BTreeSet, VecDeque};
use std::fmt;

use log::{debug, trace};
use rustc_hash::{FxHashMap, FxHashSet};

use super::arena::{EdgeId, NodeId, PortId};
use super::core::{INet, PortKind};
use crate::config::Config;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Stats {
  pub rules: u64,
  pub annihilations: u64,
  pub erasures: u64,
  pub commutations: u64,
  pub forced: u64,
  pub marked: u64,
  pub unmarked: u64,
  pub rounds: u64,
  pub sweeps: u64,
}

impl fmt::Display for Stats {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    writeln!(f, "rules: {}", self.rules)?;
    writeln!(f, "  annihilations: {}", self.annihilations)?;
    writeln!(f, "  erasures: {}", self.erasures)?;
    writeln!(f, "  commutations: {}", self.commutations)?;
    writeln!(f, "forced duplications: {}", self.forced)?;
    writeln!(f, "marked: {}, unmarked: {}", self.marked, self.unmarked)?;
    write!(f, "rounds: {}, gc sweeps: {}", self.rounds, self.sweeps)
  }
}

pub struct Session {
  pub net: INet,
  pub(crate) root: PortId,
  pub(crate) cuts: VecDeque<EdgeId>,
  pub(crate) pending: BTreeSet<NodeId>,
  pub(crate) free: FxHashMap<String, Vec<PortId>>,
  pub(crate) config: Config,
  pub(crate) stats: Stats,
  pub(crate) since_sweep: u64,
  // Nesting of demand-driven descents; interval sweeps only happen at the outermost one.
  pub(crate) depth: usize,
  pub(crate) demanding: FxHashSet<PortId>,
}

impl Session {
  pub fn new(config: Config) -> Self {
    let mut net = INet::new();
    let root = net.new_port(PortKind::Boundary, None);
    Session {
      net,
      root,
      cuts: VecDeque::new(),
      pending: BTreeSet::new(),
      free: FxHashMap::default(),
      config,
      stats: Stats::default(),
      since_sweep: 0,
      depth: 0,
      demanding: FxHashSet::default(),
    }
  }

  // Drops the current net and every piece of run state.
  pub fn clear(&mut self) {
    *self = Session::new(self.config);
  }

  pub fn root(&self) -> PortId {
    self.root
  }

  pub fn config(&self) -> &Config {
    &self.config
  }

  pub fn stats(&self) -> &Stats {
    &self.stats
  }

  pub fn cut_count(&self) -> usize {
    self.cuts.len()
  }

  pub fn pending_count(&self) -> usize {
    self.pending.len()
  }

  pub fn is_pending(&self, node: NodeId) -> bool {
    self.pending.contains(&node)
  }

  // Queues every edge of the list that is an active pair.
  pub(crate) fn enqueue_active(&mut self, edges: Vec<EdgeId>) {
    for edge in edges {
      if self.net.is_active_pair(edge) {
        trace!("cut {:?}", edge);
        self.cuts.push_back(edge);
      }
    }
  }

  // Fires the rule for one queued edge. Entries that stopped being active pairs are skipped.
  pub(crate) fn interact(&mut self, edge: EdgeId) -> bool {
    if !self.net.is_active_pair(edge) {
      return false;
    }
    let fresh = self.reduce_active_pair(edge);
    self.enqueue_active(fresh);
    true
  }

  pub(crate) fn tick(&mut self) {
    self.since_sweep += 1;
    if self.depth <= 1 && self.since_sweep >= self.config.gc_interval.get() {
      self.collect_garbage();
    }
  }

  // Drains the cut queue.
  pub fn normalize(&mut self) {
    while let Some(edge) = self.cuts.pop_front() {
      if self.interact(edge) {
        self.tick();
      }
    }
  }

  // Processes at most `budget` active pairs and returns how many were actually processed.
  pub fn run(&mut self, budget: u64) -> u64 {
    let mut done = 0;
    while done < budget {
      let edge = match self.cuts.pop_front() {
        Some(edge) => edge,
        None => break,
      };
      if self.interact(edge) {
        done += 1;
        self.tick();
      }
    }
    debug!("ran {} active pairs, {} queued", done, self.cuts.len());
    done
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::Strategy;
  use crate::term::Term;

  #[test]
  fn new_session_is_empty() {
    let session = Session::new(Config::default());
    assert_eq!(session.cut_count(), 0);
    assert_eq!(session.pending_count(), 0);
    assert_eq!(session.net.linked(session.root()), None);
  }

  #[test]
  fn clear_forgets_the_previous_run() {
    let config = Config::default().with_strategy(Strategy::Bulk);
    let mut session = Session::new(config);
    let term = Term::app(Term::lam("x", Term::var("x")), Term::var("y"));
    session.encode(&term).unwrap();
    assert_eq!(session.cut_count(), 1);
    session.clear();
    assert_eq!(session.cut_count(), 0);
    assert!(session.net.nodes.is_empty());
    assert!(session.free.is_empty());
    assert_eq!(session.config(), &config);
  }

  #[test]
  fn run_respects_the_budget() {
    let mut session = Session::new(Config::default());
    let term = Term::app(Term::lam("x", Term::var("x")), Term::var("y"));
    session.encode(&term).unwrap();
    assert_eq!(session.run(0), 0);
    assert_eq!(session.run(10), 1);
    assert_eq!(session.stats().rules, 1);
  }
}
