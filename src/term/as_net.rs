// Converts Terms to Nets, and back.

use log::debug;
use rustc_hash::FxHashMap;

use super::*;
use crate::error::{DecodeError, EncodeError};
use crate::inet::{describe_port, PortId, PortKind, Session, Slot, Symbol};

// Binder ports of the variables in scope. Each entry is the port the next occurrence hangs off.
type Scope = FxHashMap<String, PortId>;

fn check_name(name: &str) -> Result<(), EncodeError> {
  if name.is_empty() {
    return Err(EncodeError::MalformedTerm { reason: "empty variable name".to_string() });
  }
  if let Some(c) = name.chars().find(|c| c.is_whitespace() || matches!(*c, '(' | ')' | '.')) {
    return Err(EncodeError::MalformedTerm { reason: format!("`{}` in variable name `{}`", c, name) });
  }
  Ok(())
}

// Checks every name of a term before anything gets allocated.
fn validate(term: &Term) -> Result<(), EncodeError> {
  let mut stack = vec![term];
  while let Some(term) = stack.pop() {
    match term {
      Var { nam } => check_name(nam)?,
      Lam { nam, bod } => {
        check_name(nam)?;
        stack.push(bod);
      }
      App { fun, arg } => {
        stack.push(fun);
        stack.push(arg);
      }
    }
  }
  Ok(())
}

impl Session {
  // Replaces the session's net by the encoding of `term`, wired to the root port. Active pairs
  // found along the way are queued.
  pub fn encode(&mut self, term: &Term) -> Result<PortId, EncodeError> {
    validate(term)?;
    self.clear();
    let mut scope = Scope::default();
    let main = self.encode_term(term, &mut scope);
    let root = self.root;
    self.net.connect(root, main);
    debug!(
      "encoded {} nodes, {} free variables, {} cuts",
      self.net.nodes.len(),
      self.free.len(),
      self.cuts.len()
    );
    Ok(root)
  }

  // Encodes a term and returns the port that stands for its value.
  fn encode_term(&mut self, term: &Term, scope: &mut Scope) -> PortId {
    match term {
      // An occurrence of a bound variable hangs a duplicator off the binder. Its principal port
      // takes the binder's place, its left port is the occurrence, and its right port is where the
      // next occurrence will hang.
      Var { nam } => match scope.get(nam).copied() {
        Some(binder) => {
          let dup = self.net.new_node(Symbol::Duplicator);
          let [left, right] = self.net.aux(dup);
          if let Some(principal) = self.net.port(dup, Slot::Principal) {
            self.net.connect(principal, binder);
          }
          scope.insert(nam.clone(), right);
          left
        }
        None => {
          let port = self.net.new_port(PortKind::Free, Some(nam.clone()));
          self.free.entry(nam.clone()).or_default().push(port);
          port
        }
      },
      // A lambda becomes a con node. Ports:
      // - principal: where the lambda occurs.
      // - left: the bound variable, named.
      // - right: the body.
      Lam { nam, bod } => {
        let lam = self.net.new_node(Symbol::Constructor);
        let [var, body] = self.net.aux(lam);
        self.net.ports[var].name = Some(nam.clone());
        let shadowed = scope.insert(nam.clone(), var);
        let value = self.encode_term(bod, scope);
        self.net.connect(body, value);
        match shadowed {
          Some(outer) => scope.insert(nam.clone(), outer),
          None => scope.remove(nam),
        };
        self.close_binder(var);
        self.net.port(lam, Slot::Principal).unwrap_or(var)
      }
      // An application becomes a con node too. Ports:
      // - principal: the function being applied.
      // - left: the argument.
      // - right: where the application occurs.
      App { fun, arg } => {
        let app = self.net.new_node(Symbol::Constructor);
        let [argument, result] = self.net.aux(app);
        let function = self.encode_term(fun, scope);
        let cut = self.net.port(app, Slot::Principal).map(|principal| self.net.connect(principal, function));
        let value = self.encode_term(arg, scope);
        self.net.connect(argument, value);
        if let Some(cut) = cut {
          self.enqueue_active(vec![cut]);
        }
        result
      }
    }
  }

  // Tidies the chain of duplicators hanging off a binder once its body is encoded: an unused
  // binder gets an eraser, and the last duplicator of the chain, whose right port went unused,
  // is bypassed.
  fn close_binder(&mut self, binder: PortId) {
    let mut port = binder;
    loop {
      let Some((dup, _)) = self.net.enter(port) else {
        let eraser = self.net.new_node(Symbol::Eraser);
        if let Some(principal) = self.net.port(eraser, Slot::Principal) {
          self.net.connect(port, principal);
        }
        return;
      };
      let [left, right] = self.net.aux(dup);
      if self.net.linked(right).is_some() {
        port = right;
        continue;
      }
      if let Some(usage) = self.net.linked(left) {
        self.net.connect(port, usage);
      }
      self.net.free_node(dup);
      return;
    }
  }

  // Reads the term wired to the root port. Shared subterms are read once, through the memo slot
  // of the duplicator sharing them, and binders are renamed away from every name in scope.
  pub fn decode(&mut self) -> Result<Term, DecodeError> {
    enum Task {
      Read(PortId, im::HashSet<String>),
      Lam(String),
      App,
      Memo(crate::inet::NodeId),
    }

    for node in self.net.nodes.values_mut() {
      node.memo.take();
    }
    let free: im::HashSet<String> = self.free.keys().cloned().collect();
    let mut tasks = vec![Task::Read(self.root, free)];
    let mut terms: Vec<Term> = Vec::new();

    while let Some(task) = tasks.pop() {
      match task {
        Task::Read(port, scope) => {
          let Some(other) = self.net.linked(port) else {
            return Err(DecodeError::Dangling { port: format!("{:?}", port), context: describe_port(&self.net, port) });
          };
          let kind = self.net.ports[other].kind;
          let (node, slot) = match kind {
            PortKind::Cell(node, slot) => (node, slot),
            PortKind::Free => {
              let nam = self.net.name(other).unwrap_or_default().to_string();
              terms.push(Term::var(nam));
              continue;
            }
            PortKind::Boundary => return Err(self.unreadable("the boundary port", other)),
            PortKind::Bridge => return Err(self.unreadable("a bridge port", other)),
          };
          let symbol = self.net.symbol(node);
          match (symbol, slot) {
            (Symbol::Eraser, _) => return Err(self.unreadable("an eraser", other)),
            (_, Slot::Principal) if symbol.is_duplicator() => {
              return Err(self.unreadable("a duplicator entered through its principal port", other));
            }
            // Either output of a duplicator: the first visit reads the shared term, the second
            // one reuses it.
            _ if symbol.is_duplicator() => match self.net.nodes[node].memo.take() {
              Some(term) => terms.push(term),
              None => {
                let Some(principal) = self.net.port(node, Slot::Principal) else {
                  return Err(self.unreadable("a duplicator without a principal port", other));
                };
                tasks.push(Task::Memo(node));
                tasks.push(Task::Read(principal, scope));
              }
            },
            (_, Slot::Principal) => {
              let (Some(var), Some(body)) = (self.net.port(node, Slot::Left), self.net.port(node, Slot::Right)) else {
                return Err(self.unreadable("a malformed constructor", other));
              };
              let Some(mut nam) = self.net.name(var).map(str::to_string) else {
                return Err(self.unreadable("an application entered through its principal port", other));
              };
              while scope.contains(&nam) {
                nam.push('\'');
              }
              self.net.ports[var].name = Some(nam.clone());
              tasks.push(Task::Lam(nam.clone()));
              tasks.push(Task::Read(body, scope.update(nam)));
            }
            (_, Slot::Right) => {
              let (Some(function), Some(argument)) = (self.net.port(node, Slot::Principal), self.net.port(node, Slot::Left)) else {
                return Err(self.unreadable("a malformed constructor", other));
              };
              tasks.push(Task::App);
              tasks.push(Task::Read(argument, scope.clone()));
              tasks.push(Task::Read(function, scope));
            }
            (_, Slot::Left) => match self.net.name(other) {
              Some(nam) => terms.push(Term::var(nam)),
              None => return Err(self.unreadable("the argument port of an application", other)),
            },
          }
        }
        Task::Lam(nam) => {
          let bod = terms.pop().unwrap_or_else(|| unreachable!("lambda body was read"));
          terms.push(Term::lam(nam, bod));
        }
        Task::App => {
          let arg = terms.pop().unwrap_or_else(|| unreachable!("argument was read"));
          let fun = terms.pop().unwrap_or_else(|| unreachable!("function was read"));
          terms.push(Term::app(fun, arg));
        }
        Task::Memo(node) => {
          if let (Some(term), Some(node)) = (terms.last(), self.net.nodes.get_mut(node)) {
            node.memo.store(term.clone());
          }
        }
      }
    }
    terms.pop().ok_or_else(|| self.unreadable("an empty net", self.root))
  }

  fn unreadable(&self, what: &'static str, port: PortId) -> DecodeError {
    DecodeError::Unreadable { what, context: describe_port(&self.net, port) }
  }
}
