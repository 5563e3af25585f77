use foundation_sync::CancellationToken;
use foundation_workers::run_gate_scenario;

use crate::{config_arg, load_config, seed_arg, BoxedError};

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("gate")
            .about("readers and writers sharing one resource behind a readers-writer gate")
            .arg(
                clap::Arg::new("readers")
                    .long("readers")
                    .help("number of reader threads")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("writers")
                    .long("writers")
                    .help("number of writer threads")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("iterations")
                    .long("iterations")
                    .help("reads or writes done by each worker")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(usize)),
            )
            .arg(
                clap::Arg::new("initial")
                    .long("initial")
                    .help("content the resource starts with")
                    .action(clap::ArgAction::Set)
                    .value_parser(clap::value_parser!(String)),
            )
            .arg(seed_arg())
            .arg(config_arg()),
    )
}

pub fn run(
    args: &clap::ArgMatches,
    stop: &CancellationToken,
) -> std::result::Result<(), BoxedError> {
    let mut config = load_config(args)?.gate;

    if let Some(readers) = args.get_one::<usize>("readers") {
        config = config.readers(*readers);
    }
    if let Some(writers) = args.get_one::<usize>("writers") {
        config = config.writers(*writers);
    }
    if let Some(iterations) = args.get_one::<usize>("iterations") {
        config = config.iterations(*iterations);
    }
    if let Some(initial) = args.get_one::<String>("initial") {
        config = config.initial(initial.clone());
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.seed(*seed);
    }

    ewe_logs::info!("Resource initialized with: {}", config.get_initial());

    let report = run_gate_scenario(&config, stop)?;
    println!("\n{report}");

    if report.failures() > 0 {
        ewe_logs::warn!("{} operations failed", report.failures());
    }

    Ok(())
}
