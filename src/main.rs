//! Count distinct normalized email identities across contact files.
//!
//! Each file holds `<id>\t<email>` records, one per line.

use std::path::PathBuf;
use std::process;

use clap::Parser;
use env_logger;

use email_census::{self, Config, ProcessMemory};

#[derive(Parser)]
#[command(name = "email-census")]
#[command(about = "Count distinct email identities and how many appear only once")]
struct Args {
    #[arg(help = "Tab separated contact files to read")]
    files: Vec<PathBuf>,

    #[arg(short, long, default_value_t = email_census::DEFAULT_PARALLELISM, help = "Number of shards and aggregator threads")]
    parallelism: u32,

    #[arg(long, default_value_t = email_census::DEFAULT_CHANNEL_CAPACITY, help = "Contacts buffered per shard before readers block")]
    channel_capacity: usize,
}

fn main() {
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");

    env_logger::init_from_env(env);

    let args = Args::parse();

    let config = Config {
        parallelism: args.parallelism,
        channel_capacity: args.channel_capacity,
        ..Config::default()
    };

    match email_census::count_contacts(args.files, &config, &ProcessMemory) {
        Ok(report) => {
            println!("\n{}", report.summary);
            println!(
                "Memory used: {:.2} MB",
                email_census::as_megabytes(report.memory_delta)
            );
            log::info!(
                "Read {} contacts in {:.2}s.",
                report.contacts_read,
                report.elapsed.as_secs_f64()
            );
        }
        Err(error) => {
            log::error!("Failed to count contacts: {}", error);
            for cause in error.iter_causes() {
                log::error!("cause: {}", cause);
            }
            process::exit(1);
        }
    }
}
