use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;

use crate::error::ConfigError;

pub const DEFAULT_GC_INTERVAL: u64 = 100_000;

// How pending duplicators get resolved once the cut queue runs dry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Strategy {
  // Top-down, forcing only what the next piece of the result needs.
  Demand,
  // Whole-queue drains alternating with scans of every pending duplicator.
  Bulk,
}

impl FromStr for Strategy {
  type Err = ConfigError;

  fn from_str(text: &str) -> Result<Self, Self::Err> {
    match text {
      "demand" => Ok(Strategy::Demand),
      "bulk" => Ok(Strategy::Bulk),
      other => Err(ConfigError::UnknownStrategy(other.to_string())),
    }
  }
}

impl fmt::Display for Strategy {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      Strategy::Demand => write!(f, "demand"),
      Strategy::Bulk => write!(f, "bulk"),
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Config {
  // Active pairs processed between two garbage collection sweeps.
  pub gc_interval: NonZeroU64,
  pub strategy: Strategy,
}

impl Default for Config {
  fn default() -> Self {
    Config {
      gc_interval: NonZeroU64::new(DEFAULT_GC_INTERVAL).unwrap_or(NonZeroU64::MIN),
      strategy: Strategy::Demand,
    }
  }
}

impl Config {
  pub fn with_gc_interval(self, interval: u64) -> Result<Self, ConfigError> {
    let gc_interval = NonZeroU64::new(interval).ok_or(ConfigError::ZeroGcInterval)?;
    Ok(Config { gc_interval, ..self })
  }

  pub fn with_strategy(self, strategy: Strategy) -> Self {
    Config { strategy, ..self }
  }
}

// Reads a garbage collection interval given as text, e.g. on the command line.
pub fn parse_gc_interval(text: &str) -> Result<u64, ConfigError> {
  text.trim().parse::<u64>().map_err(|source| ConfigError::InvalidGcInterval { text: text.to_string(), source })
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn defaults() {
    let config = Config::default();
    assert_eq!(config.gc_interval.get(), 100_000);
    assert_eq!(config.strategy, Strategy::Demand);
  }

  #[test]
  fn zero_interval_is_rejected() {
    assert!(matches!(Config::default().with_gc_interval(0), Err(ConfigError::ZeroGcInterval)));
    assert_eq!(Config::default().with_gc_interval(1).unwrap().gc_interval.get(), 1);
  }

  #[test]
  fn interval_text_must_be_a_number() {
    assert_eq!(parse_gc_interval("250"), Ok(250));
    let err = parse_gc_interval("abc").unwrap_err();
    assert!(matches!(err, ConfigError::InvalidGcInterval { .. }));
    assert!(err.to_string().contains("`abc`"));
    // Zero parses, and is rejected by the setter instead.
    assert_eq!(parse_gc_interval("0"), Ok(0));
  }

  #[test]
  fn strategy_names() {
    assert_eq!("bulk".parse::<Strategy>().unwrap(), Strategy::Bulk);
    assert_eq!(Strategy::Demand.to_string(), "demand");
    assert!("lazy".parse::<Strategy>().is_err());
  }
}
