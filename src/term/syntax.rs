// Term parser and stringifier. Grammar:
// <Term> ::= <Lam> | <App>
// <Lam>  ::= "L" <name> "." <Term>
// <App>  ::= <Atom> { <Atom> } [ <Lam> ]
// <Atom> ::= <name> | "(" <Term> ")"
// <name> ::= { <letter> | <digit> | "_" | "'" }, except "L" alone
// "λ" and "\" are accepted in place of "L".

use std::fmt;

use super::*;
use crate::error::ParseError;

fn is_name_char(c: char) -> bool {
  c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

// Parses a name, returns the remaining code and the name.
fn parse_name(code: &str) -> (&str, &str) {
  let end = code.find(|c: char| !is_name_char(c)).unwrap_or(code.len());
  (&code[end..], &code[..end])
}

fn skip_whitespace(code: &str) -> &str {
  code.trim_start()
}

// Consumes a binder symbol, if the code starts with one.
fn parse_lambda(code: &str) -> Option<&str> {
  if let Some(rest) = code.strip_prefix('λ').or_else(|| code.strip_prefix('\\')) {
    return Some(rest);
  }
  match parse_name(code) {
    (rest, "L") => Some(rest),
    _ => None,
  }
}

// An application spine under construction, along with what opened it.
struct Frame {
  opener: Opener,
  fun: Option<Term>,
}

enum Opener {
  Top,
  Lam(String),
  Paren,
}

impl Frame {
  fn new(opener: Opener) -> Self {
    Frame { opener, fun: None }
  }

  // Appends one more element to the spine.
  fn push(&mut self, arg: Term) {
    self.fun = Some(match self.fun.take() {
      Some(fun) => Term::app(fun, arg),
      None => arg,
    });
  }
}

// Nesting is kept on an explicit stack of frames, so deep terms never exhaust the call stack.
struct Parser<'a> {
  src: &'a str,
}

impl<'a> Parser<'a> {
  fn offset(&self, code: &str) -> usize {
    self.src.len() - code.len()
  }

  fn unexpected(&self, code: &str) -> ParseError {
    match code.chars().next() {
      Some(c) => ParseError::UnexpectedToken { found: c.to_string(), offset: self.offset(code) },
      None => ParseError::UnexpectedEnd { offset: self.src.len() },
    }
  }

  // Parses the binder name and the dot after a lambda symbol.
  fn binder(&self, code: &'a str) -> Result<(&'a str, &'a str), ParseError> {
    let code = skip_whitespace(code);
    let (rest, nam) = parse_name(code);
    if nam.is_empty() || nam == "L" {
      return Err(ParseError::ExpectedName { offset: self.offset(code) });
    }
    let rest = skip_whitespace(rest);
    match rest.strip_prefix('.') {
      Some(rest) => Ok((rest, nam)),
      None => Err(ParseError::ExpectedDot { offset: self.offset(rest) }),
    }
  }

  fn parse(&self) -> Result<Term, ParseError> {
    let mut stack = vec![Frame::new(Opener::Top)];
    let mut code = self.src;
    loop {
      code = skip_whitespace(code);
      if let Some(rest) = parse_lambda(code) {
        let (rest, nam) = self.binder(rest)?;
        stack.push(Frame::new(Opener::Lam(nam.to_string())));
        code = rest;
        continue;
      }
      if let Some(rest) = code.strip_prefix('(') {
        stack.push(Frame::new(Opener::Paren));
        code = rest;
        continue;
      }
      let (rest, nam) = parse_name(code);
      if !nam.is_empty() {
        if let Some(frame) = stack.last_mut() {
          frame.push(Term::var(nam));
        }
        code = rest;
        continue;
      }
      if !code.is_empty() && !code.starts_with(')') {
        return Err(self.unexpected(code));
      }
      // The innermost spine ends here. A lambda extends as far right as it can, so closing one
      // also closes the spine it is the last element of.
      loop {
        let Some(Frame { opener, fun: Some(term) }) = stack.pop() else {
          return Err(self.unexpected(code));
        };
        match opener {
          Opener::Top if code.is_empty() => return Ok(term),
          Opener::Top => return Err(ParseError::TrailingInput { offset: self.offset(code) }),
          Opener::Lam(nam) => match stack.last_mut() {
            Some(parent) => parent.push(Term::lam(nam, term)),
            None => return Err(self.unexpected(code)),
          },
          Opener::Paren => {
            let Some(rest) = code.strip_prefix(')') else {
              return Err(self.unexpected(code));
            };
            code = rest;
            if let Some(parent) = stack.last_mut() {
              parent.push(term);
            }
            break;
          }
        }
      }
    }
  }
}

// Converts a source-code to a term.
pub fn from_string(code: &str) -> Result<Term, ParseError> {
  Parser { src: code }.parse()
}

// Converts a term back to a source-code. Subterms of an application are parenthesized unless they
// are variables.
pub fn to_string(term: &Term) -> String {
  fn stringify(term: &Term, code: &mut String) {
    match term {
      Var { nam } => code.push_str(nam),
      Lam { nam, bod } => {
        code.push_str("L ");
        code.push_str(nam);
        code.push_str(" . ");
        stringify(bod, code);
      }
      App { fun, arg } => {
        operand(fun, code);
        code.push(' ');
        operand(arg, code);
      }
    }
  }
  fn operand(term: &Term, code: &mut String) {
    if let Var { nam } = term {
      code.push_str(nam);
    } else {
      code.push('(');
      stringify(term, code);
      code.push(')');
    }
  }
  let mut code = String::new();
  stringify(term, &mut code);
  code
}

impl fmt::Display for Term {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", to_string(self))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn application_is_left_associative() {
    let term = from_string("a b c").unwrap();
    let expected = Term::app(Term::app(Term::var("a"), Term::var("b")), Term::var("c"));
    assert_eq!(term, expected);
  }

  #[test]
  fn lambda_body_extends_to_the_right() {
    let term = from_string("L x . x L y . y").unwrap();
    let expected = Term::lam("x", Term::app(Term::var("x"), Term::lam("y", Term::var("y"))));
    assert_eq!(term, expected);
  }

  #[test]
  fn names_with_primes_and_alternative_binders() {
    let term = from_string("\\a' . λLx . a' Lx").unwrap();
    let expected = Term::lam("a'", Term::lam("Lx", Term::app(Term::var("a'"), Term::var("Lx"))));
    assert_eq!(term, expected);
  }

  #[test]
  fn printing_parenthesizes_non_variables() {
    let term = from_string("(L x . x x) (L f . L a . a f f)").unwrap();
    assert_eq!(to_string(&term), "(L x . x x) (L f . L a . (a f) f)");
    let term = from_string("L x . (x x) (x x)").unwrap();
    assert_eq!(term.to_string(), "L x . (x x) (x x)");
    assert_eq!(from_string(&term.to_string()).unwrap(), term);
  }

  #[test]
  fn errors_carry_offsets() {
    assert_eq!(from_string(""), Err(ParseError::UnexpectedEnd { offset: 0 }));
    assert_eq!(from_string("L . x"), Err(ParseError::ExpectedName { offset: 2 }));
    assert_eq!(from_string("L x x"), Err(ParseError::ExpectedDot { offset: 4 }));
    assert_eq!(from_string("(a b"), Err(ParseError::UnexpectedEnd { offset: 4 }));
    assert_eq!(from_string("L x . "), Err(ParseError::UnexpectedEnd { offset: 6 }));
    assert_eq!(from_string("()"), Err(ParseError::UnexpectedToken { found: ")".to_string(), offset: 1 }));
    assert_eq!(from_string("a b)"), Err(ParseError::TrailingInput { offset: 3 }));
    assert_eq!(from_string("a . b"), Err(ParseError::UnexpectedToken { found: ".".to_string(), offset: 2 }));
  }

  #[test]
  fn deeply_nested_terms_parse_without_recursion() {
    let depth = 1024;
    let code = format!("L f . L x . {}f x{}", "f (".repeat(depth - 1), ")".repeat(depth - 1));
    let mut body = Term::var("x");
    for _ in 0..depth {
      body = Term::app(Term::var("f"), body);
    }
    let expected = Term::lam("f", Term::lam("x", body));
    assert!(from_string(&code).unwrap() == expected);
    let parens = format!("{}y{}", "(".repeat(5000), ")".repeat(5000));
    assert_eq!(from_string(&parens), Ok(Term::var("y")));
  }
}
