// Textual rendering of a net. Every live node becomes one line:
// <Node> ::= "[" <wire> <wire> <wire> "]" <symbol> [":" <binder>]
// Wires are named by the edge they stand for. The boundary shows up as "_", a free variable as
// "$name", and an unconnected port as "-".

use std::fmt::Write;

use rustc_hash::FxHashMap;

use super::arena::{EdgeId, NodeId, PortId};
use super::core::{INet, PortKind, Slot};

// Generates the name of the n-th wire: a, b, ..., z, ba, bb, ...
fn wire_name(mut n: usize) -> String {
  let mut name = Vec::new();
  loop {
    name.push(b'a' + (n % 26) as u8);
    n /= 26;
    if n == 0 {
      break;
    }
  }
  name.reverse();
  String::from_utf8_lossy(&name).to_string()
}

struct Namer<'a> {
  net: &'a INet,
  names: FxHashMap<EdgeId, String>,
}

impl<'a> Namer<'a> {
  fn show(&mut self, port: Option<PortId>) -> String {
    let Some(port) = port else {
      return "-".to_string();
    };
    let net = self.net;
    let Some(other) = net.linked(port) else {
      return "-".to_string();
    };
    match &net.ports[other] {
      p if p.kind == PortKind::Boundary => "_".to_string(),
      p if p.kind == PortKind::Free => format!("${}", p.name.as_deref().unwrap_or("?")),
      p => {
        let next = self.names.len();
        match p.edge {
          Some(edge) => self.names.entry(edge).or_insert_with(|| wire_name(next)).clone(),
          None => "-".to_string(),
        }
      }
    }
  }
}

// Renders every live node of the net.
pub fn show_net(net: &INet) -> String {
  let mut namer = Namer { net, names: FxHashMap::default() };
  let mut code = String::new();
  for (node, _) in net.nodes.iter() {
    show_node(&mut namer, node, &mut code);
  }
  code
}

fn show_node(namer: &mut Namer, node: NodeId, code: &mut String) {
  let net = namer.net;
  let ports: Vec<String> = Slot::ALL.iter().take(net.symbol(node).arity()).map(|slot| namer.show(net.port(node, *slot))).collect();
  let _ = write!(code, "[{}]{}", ports.join(" "), net.symbol(node).tag());
  if let Some(binder) = net.port(node, Slot::Left).and_then(|port| net.name(port)) {
    let _ = write!(code, ":{}", binder);
  }
  code.push('\n');
}

// Describes a port and its immediate surroundings, for error messages.
pub fn describe_port(net: &INet, port: PortId) -> String {
  let mut text = String::new();
  match net.ports.get(port) {
    None => {
      let _ = write!(text, "{:?} has been released", port);
    }
    Some(p) => {
      let _ = write!(text, "{:?} is a {:?} port", port, p.kind);
      if let Some(name) = &p.name {
        let _ = write!(text, " named `{}`", name);
      }
      match net.linked(port) {
        Some(other) => {
          let _ = write!(text, ", wired to {:?} ({:?})", other, net.ports[other].kind);
        }
        None => text.push_str(", wired to nothing"),
      }
    }
  }
  let mut namer = Namer { net, names: FxHashMap::default() };
  let nodes = [Some(port), net.linked(port)];
  for node in nodes.iter().flatten().filter_map(|port| net.owner(*port)).map(|(node, _)| node) {
    text.push_str("\n  ");
    let _ = write!(text, "{:?} = ", node);
    show_node(&mut namer, node, &mut text);
    text.pop();
  }
  text
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::inet::core::Symbol;

  #[test]
  fn wire_names() {
    assert_eq!(wire_name(0), "a");
    assert_eq!(wire_name(25), "z");
    assert_eq!(wire_name(26), "ba");
  }

  #[test]
  fn identity_renders_as_one_lambda() {
    let mut net = INet::new();
    let root = net.new_port(PortKind::Boundary, None);
    let lam = net.new_node(Symbol::Constructor);
    let [left, right] = net.aux(lam);
    net.ports[left].name = Some("x".to_string());
    net.connect(left, right);
    net.connect(root, net.port(lam, Slot::Principal).unwrap());
    assert_eq!(show_net(&net), "[_ a a]CON:x\n");
  }

  #[test]
  fn free_variables_and_loose_ports_are_marked() {
    let mut net = INet::new();
    let era = net.new_node(Symbol::Eraser);
    let dup = net.new_node(Symbol::Duplicator);
    let y = net.new_port(PortKind::Free, Some("y".to_string()));
    net.connect(net.port(dup, Slot::Principal).unwrap(), y);
    net.connect(net.port(dup, Slot::Left).unwrap(), net.port(era, Slot::Principal).unwrap());
    assert_eq!(show_net(&net), "[a]ERA\n[$y a -]DUP\n");
    let context = describe_port(&net, y);
    assert!(context.contains("Free"));
    assert!(context.contains("DUP"));
  }
}
