use clap::Parser;

use rill::{dispatch, guess, Pipeline};

#[derive(Parser)]
#[command(name = "rill")]
#[command(about = "Convert record streams between CSV, JSON, JSON lines and plain-text tables")]
#[command(version)]
struct Args {
    /// Input: a file path (.csv/.json/.jsonl), or a format name to read stdin
    #[arg(value_name = "INPUT")]
    input: String,

    /// Output: a file path (.csv/.json/.jsonl/.tab), or a format name to write stdout
    #[arg(value_name = "OUTPUT")]
    output: String,

    /// Re-type string fields: numbers, booleans, nulls and timestamps
    #[arg(long)]
    guess: bool,
}

fn main() {
    let args = Args::parse();

    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let producer = dispatch::producer_for(&args.input)?;
    let collector = dispatch::collector_for(&args.output)?;

    let mut pipeline = Pipeline::from_producer(producer);
    if args.guess {
        pipeline = pipeline.process(guess::guess_record);
    }
    pipeline.collect(collector)?;

    Ok(())
}
