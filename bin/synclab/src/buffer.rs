use foundation_sync::CancellationToken;
use foundation_workers::run_buffer_scenario;

use crate::{config_arg, load_config, seed_arg, BoxedError};

fn count_arg(name: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(name)
        .long(name)
        .help(help)
        .action(clap::ArgAction::Set)
        .value_parser(clap::value_parser!(usize))
}

pub fn register(command: clap::Command) -> clap::Command {
    command.subcommand(
        clap::Command::new("buffer")
            .about("producers and consumers sharing a bounded buffer")
            .arg(count_arg("capacity", "number of buffer slots"))
            .arg(count_arg("producers", "number of producer threads"))
            .arg(count_arg("consumers", "number of consumer threads"))
            .arg(count_arg("items", "items inserted by each producer"))
            .arg(seed_arg())
            .arg(config_arg()),
    )
}

pub fn run(
    args: &clap::ArgMatches,
    stop: &CancellationToken,
) -> std::result::Result<(), BoxedError> {
    let mut config = load_config(args)?.buffer;

    if let Some(capacity) = args.get_one::<usize>("capacity") {
        config = config.capacity(*capacity);
    }
    if let Some(producers) = args.get_one::<usize>("producers") {
        config = config.producers(*producers);
    }
    if let Some(consumers) = args.get_one::<usize>("consumers") {
        config = config.consumers(*consumers);
    }
    if let Some(items) = args.get_one::<usize>("items") {
        config = config.items_per_producer(*items);
    }
    if let Some(seed) = args.get_one::<u64>("seed") {
        config = config.seed(*seed);
    }

    let report = run_buffer_scenario(&config, stop)?;
    println!("\n{report}");

    if !report.is_complete() {
        ewe_logs::warn!(
            "Only {} of {} items went through the buffer",
            report.consumed,
            report.expected
        );
    }

    Ok(())
}
