use automata_sim::{
    read_batch, render_batch, render_json, Automaton, Description, DescriptionLoader, Dpda,
    MachineKind, Nfa, SampleCatalog, TuringMachine, SAMPLES,
};
use clap::{Parser, ValueEnum};
use log::{debug, info};
use std::error::Error;
use std::io;
use std::path::PathBuf;

/// Runs NFA, DPDA and Turing machine descriptions against a batch of input cases.
///
/// The batch starts with the number of cases, followed by one comma separated case per line.
#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None, arg_required_else_help = true)]
#[clap(after_help = "EXAMPLES:
  automata machines/anbn.dpda --input cases.txt
  printf '2\\na,b\\nb,a\\n' | automata --sample ends-with-ab
  automata --list")]
struct Cli {
    /// The machine description file to load (.nfa, .dpda or .tm)
    description: Option<PathBuf>,

    /// The machine kind, when it cannot be inferred from the file extension
    #[clap(short, long, value_enum)]
    kind: Option<Kind>,

    /// Run one of the embedded sample machines instead of a file
    #[clap(short, long, conflicts_with = "description")]
    sample: Option<String>,

    /// Read the batch of input cases from this file instead of stdin
    #[clap(short, long)]
    input: Option<PathBuf>,

    /// Print the runs as JSON
    #[clap(long)]
    json: bool,

    /// List the embedded sample machines and exit
    #[clap(short, long)]
    list: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Kind {
    Nfa,
    Dpda,
    Tm,
}

impl From<Kind> for MachineKind {
    fn from(kind: Kind) -> Self {
        match kind {
            Kind::Nfa => MachineKind::Nfa,
            Kind::Dpda => MachineKind::Dpda,
            Kind::Tm => MachineKind::Tm,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> Result<(), Box<dyn Error>> {
    if cli.list {
        for sample in SAMPLES.iter() {
            println!("{:<16} {}", sample.name, sample.kind);
        }
        return Ok(());
    }

    let description = load_description(cli)?;
    let cases = load_cases(cli)?;
    info!(
        "running {} case(s) on a {} description",
        cases.len(),
        description.kind
    );

    let output = match description.kind {
        MachineKind::Nfa => simulate::<Nfa>(&description, &cases, cli.json)?,
        MachineKind::Dpda => simulate::<Dpda>(&description, &cases, cli.json)?,
        MachineKind::Tm => simulate::<TuringMachine>(&description, &cases, cli.json)?,
    };

    print!("{}", output);

    Ok(())
}

/// Loads the description from a sample name or a file.
///
/// An explicit `--kind` wins over the file extension.
fn load_description(cli: &Cli) -> Result<Description, Box<dyn Error>> {
    if let Some(name) = &cli.sample {
        let sample = SampleCatalog::get(name)?;
        debug!("using sample {}", sample.name);
        return Ok(sample.description()?);
    }

    let Some(path) = &cli.description else {
        return Err("no description given: pass a file or --sample NAME".into());
    };

    let description = match cli.kind {
        Some(kind) => DescriptionLoader::load(path, kind.into())?,
        None => DescriptionLoader::load_inferred(path)?,
    };

    Ok(description)
}

/// Reads the batch of input cases from `--input`, or from piped stdin.
fn load_cases(cli: &Cli) -> Result<Vec<Vec<String>>, Box<dyn Error>> {
    if let Some(path) = &cli.input {
        return Ok(DescriptionLoader::load_batch(path)?);
    }

    if atty::is(atty::Stream::Stdin) {
        return Err("no input cases: pipe a batch into stdin or pass --input FILE".into());
    }

    Ok(read_batch(io::stdin().lock())?)
}

/// Builds the machine once, then runs and renders every case.
fn simulate<M: Automaton>(
    description: &Description,
    cases: &[Vec<String>],
    json: bool,
) -> Result<String, Box<dyn Error>> {
    let machine = M::from_description(description)?;
    let runs = machine.run_batch(cases);

    if json {
        let mut output = render_json(description.kind, cases, &runs)?;
        output.push('\n');
        return Ok(output);
    }

    Ok(render_batch(&runs))
}
