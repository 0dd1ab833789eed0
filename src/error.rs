use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
  #[error("unexpected `{found}` at offset {offset}")]
  UnexpectedToken { found: String, offset: usize },
  #[error("unexpected end of input at offset {offset}")]
  UnexpectedEnd { offset: usize },
  #[error("expected a binder name at offset {offset}")]
  ExpectedName { offset: usize },
  #[error("expected `.` after the binder name at offset {offset}")]
  ExpectedDot { offset: usize },
  #[error("unexpected input after the term at offset {offset}")]
  TrailingInput { offset: usize },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
  #[error("malformed term: {reason}")]
  MalformedTerm { reason: String },
}

#[derive(Debug, Error)]
pub enum DecodeError {
  #[error("port {port} is not connected to anything\n{context}")]
  Dangling { port: String, context: String },
  #[error("cannot read a term out of {what}\n{context}")]
  Unreadable { what: &'static str, context: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
  #[error("the garbage collection interval must be positive")]
  ZeroGcInterval,
  #[error("invalid garbage collection interval `{text}`: {source}")]
  InvalidGcInterval { text: String, source: std::num::ParseIntError },
  #[error("unknown strategy `{0}` (expected `demand` or `bulk`)")]
  UnknownStrategy(String),
}

#[derive(Debug, Error)]
pub enum Error {
  #[error(transparent)]
  Parse(#[from] ParseError),
  #[error(transparent)]
  Encode(#[from] EncodeError),
  #[error(transparent)]
  Decode(#[from] DecodeError),
  #[error(transparent)]
  Config(#[from] ConfigError),
}
