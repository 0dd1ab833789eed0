mod as_net;
mod syntax;

pub use self::syntax::*;

use crate::config::Config;
use crate::error::Error;
use crate::inet::{Session, Stats};

// Terms of the lambda calculus.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Term {
  // Variables
  Var { nam: String },

  // Abstractions
  Lam { nam: String, bod: Box<Term> },

  // Applications
  App { fun: Box<Term>, arg: Box<Term> },
}

use self::Term::*;

impl Term {
  pub fn var(nam: impl Into<String>) -> Term {
    Var { nam: nam.into() }
  }

  pub fn lam(nam: impl Into<String>, bod: Term) -> Term {
    Lam { nam: nam.into(), bod: Box::new(bod) }
  }

  pub fn app(fun: Term, arg: Term) -> Term {
    App { fun: Box::new(fun), arg: Box::new(arg) }
  }

  // Equality up to the renaming of bound variables. Each bound variable is compared by the depth
  // of its binder; free variables must have the same name.
  pub fn alpha_eq(&self, other: &Term) -> bool {
    type Depths = im::HashMap<String, usize>;
    fn go(a: &Term, b: &Term, lhs: &Depths, rhs: &Depths, depth: usize) -> bool {
      match (a, b) {
        (Var { nam: x }, Var { nam: y }) => match (lhs.get(x), rhs.get(y)) {
          (Some(i), Some(j)) => i == j,
          (None, None) => x == y,
          _ => false,
        },
        (Lam { nam: x, bod: p }, Lam { nam: y, bod: q }) => {
          go(p, q, &lhs.update(x.clone(), depth), &rhs.update(y.clone(), depth), depth + 1)
        }
        (App { fun: f, arg: x }, App { fun: g, arg: y }) => go(f, g, lhs, rhs, depth) && go(x, y, lhs, rhs, depth),
        _ => false,
      }
    }
    go(self, other, &Depths::new(), &Depths::new(), 0)
  }

  // Renders the tagged tree form, e.g. APP(LAM(VAR(x), VAR(x)), VAR(y)).
  pub fn to_tree_string(&self) -> String {
    match self {
      Var { nam } => format!("VAR({})", nam),
      Lam { nam, bod } => format!("LAM(VAR({}), {})", nam, bod.to_tree_string()),
      App { fun, arg } => format!("APP({}, {})", fun.to_tree_string(), arg.to_tree_string()),
    }
  }
}

// Reduces a term to normal form.
pub fn normalize(term: &Term, config: Config) -> Result<Term, Error> {
  normalize_with_stats(term, config).map(|(term, _)| term)
}

// Reduces a term to normal form and reports how much work it took.
pub fn normalize_with_stats(term: &Term, config: Config) -> Result<(Term, Stats), Error> {
  let mut session = Session::new(config);
  session.encode(term)?;
  session.reduce();
  let normal = session.decode()?;
  Ok((normal, *session.stats()))
}
