mod buffer;
mod gate;

use foundation_sync::CancellationToken;
use foundation_workers::SynclabConfig;
use tracing::Level;

type BoxedError = Box<dyn std::error::Error + Send + Sync + 'static>;

fn main() -> std::result::Result<(), BoxedError> {
    let commander = gate::register(buffer::register(
        clap::Command::new("synclab")
            .about("Runs producer/consumer and readers/writers scenarios")
            .arg_required_else_help(true)
            .arg(
                clap::Arg::new("verbose")
                    .short('v')
                    .long("verbose")
                    .global(true)
                    .help("also log buffer waits, worker start/stop and gate hand-overs")
                    .action(clap::ArgAction::SetTrue),
            ),
    ));

    let matches = commander.get_matches();

    ewe_logs::init(log_level(matches.get_flag("verbose")))?;

    let stop = CancellationToken::new();
    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            ewe_logs::warn!("Interrupted, stopping workers");
            stop.cancel();
        })?;
    }

    match matches.subcommand() {
        Some(("buffer", arguments)) => buffer::run(arguments, &stop)?,
        Some(("gate", arguments)) => gate::run(arguments, &stop)?,
        _ => {}
    }

    Ok(())
}

/// Gate hand-overs are logged at trace level, so verbose runs go down to it.
fn log_level(verbose: bool) -> Level {
    if verbose {
        Level::TRACE
    } else {
        Level::INFO
    }
}

pub(crate) fn config_arg() -> clap::Arg {
    clap::Arg::new("config")
        .short('c')
        .long("config")
        .help("TOML file with [buffer] and [gate] tables; flags override it")
        .action(clap::ArgAction::Set)
        .value_parser(clap::value_parser!(std::path::PathBuf))
}

pub(crate) fn seed_arg() -> clap::Arg {
    clap::Arg::new("seed")
        .long("seed")
        .help("seed for the pause generator, for reproducible runs")
        .action(clap::ArgAction::Set)
        .value_parser(clap::value_parser!(u64))
}

pub(crate) fn load_config(
    args: &clap::ArgMatches,
) -> std::result::Result<SynclabConfig, BoxedError> {
    match args.get_one::<std::path::PathBuf>("config") {
        Some(path) => {
            ewe_logs::debug!("Loading configuration from {}", path.display());
            Ok(SynclabConfig::load(path)?)
        }
        None => Ok(SynclabConfig::default()),
    }
}
