use std::io::Read;
use std::process;
use std::time::Instant;

use clap::{App, Arg, ArgMatches};

use lnet::config::parse_gc_interval;
use lnet::{from_string, show_net, Config, Error, Session, Strategy};

fn cli() -> App<'static, 'static> {
  App::new("lnet")
    .version(env!("CARGO_PKG_VERSION"))
    .about("Reduces lambda terms to normal form on interaction nets")
    .arg(Arg::with_name("TERM").help("Term to reduce, e.g. \"(L x . x x) (L y . y)\". Read from stdin when absent").index(1))
    .arg(Arg::with_name("file").short("f").long("file").value_name("FILE").takes_value(true).conflicts_with("TERM").help("Reads the term from a file"))
    .arg(
      Arg::with_name("strategy")
        .short("s")
        .long("strategy")
        .value_name("STRATEGY")
        .takes_value(true)
        .possible_values(&["demand", "bulk"])
        .default_value("demand")
        .help("Order in which active pairs are reduced"),
    )
    .arg(Arg::with_name("gc-interval").short("g").long("gc-interval").value_name("STEPS").takes_value(true).help("Rewrites between garbage collections"))
    .arg(Arg::with_name("stats").long("stats").help("Prints rewrite counts and timing"))
    .arg(Arg::with_name("dump").long("dump").help("Prints the net before and after reduction"))
}

fn read_source(matches: &ArgMatches) -> Result<String, String> {
  if let Some(term) = matches.value_of("TERM") {
    return Ok(term.to_string());
  }
  if let Some(path) = matches.value_of("file") {
    return std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {}", path, e));
  }
  let mut code = String::new();
  std::io::stdin().read_to_string(&mut code).map_err(|e| format!("failed to read stdin: {}", e))?;
  Ok(code)
}

fn read_config(matches: &ArgMatches) -> Result<Config, Error> {
  let mut config = Config::default();
  if let Some(strategy) = matches.value_of("strategy") {
    config = config.with_strategy(strategy.parse::<Strategy>()?);
  }
  if let Some(interval) = matches.value_of("gc-interval") {
    config = config.with_gc_interval(parse_gc_interval(interval)?)?;
  }
  Ok(config)
}

fn run(matches: &ArgMatches) -> Result<(), String> {
  let code = read_source(matches)?;
  let config = read_config(matches).map_err(|e| e.to_string())?;
  let term = from_string(&code).map_err(|e| e.to_string())?;

  let mut session = Session::new(config);
  session.encode(&term).map_err(|e| e.to_string())?;
  if matches.is_present("dump") {
    println!("-- Input:\n\n{}\n", term);
    println!("-- Input (as net):\n\n{}", show_net(&session.net));
  }

  let start = Instant::now();
  session.reduce();
  let elapsed = start.elapsed();
  if matches.is_present("dump") {
    println!("-- Output (as net):\n\n{}", show_net(&session.net));
  }

  let normal = session.decode().map_err(|e| e.to_string())?;
  if matches.is_present("dump") {
    println!("-- Output:\n");
  }
  println!("{}", normal);

  if matches.is_present("stats") {
    println!("\n-- Stats ({} strategy):\n\n{}", session.config().strategy, session.stats());
    println!("time: {:.3?}", elapsed);
  }
  Ok(())
}

fn main() {
  env_logger::init();
  let matches = cli().get_matches();
  if let Err(err) = run(&matches) {
    eprintln!("error: {}", err);
    process::exit(1);
  }
}
