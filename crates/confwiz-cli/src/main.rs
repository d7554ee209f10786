use anyhow::Context;
use clap::{crate_version, value_parser, Arg, ArgAction, ArgMatches, Command};
use colored::Colorize;
use confwiz_cli::{Session, TerminalPrompter};
use confwiz_core::{EngineOptions, HandlerRegistry, Prompter, ResolverMode, ScriptedPrompter};
use confwiz_persist::SchemaLoader;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

fn cli() -> Command {
    let answers = Arg::new("answers")
        .long("answers")
        .value_name("FILE")
        .value_parser(value_parser!(PathBuf))
        .help("Read answers from FILE, one per line, instead of the terminal");

    Command::new("confwiz")
        .version(crate_version!())
        .about("Interactive wizard for schema-driven configuration files")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("schema")
                .long("schema")
                .short('s')
                .required(true)
                .value_name("FILE")
                .value_parser(value_parser!(PathBuf))
                .help("YAML file defining the available structures"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .action(ArgAction::Count)
                .help("Increase log verbosity (-v debug, -vv trace)"),
        )
        .arg(
            Arg::new("closed-world")
                .long("closed-world")
                .action(ArgAction::SetTrue)
                .help("Reject type annotations no strategy understands"),
        )
        .arg(
            Arg::new("max-repair-rounds")
                .long("max-repair-rounds")
                .value_name("N")
                .value_parser(value_parser!(usize))
                .help("Give up after N rounds of validation repair"),
        )
        .subcommand(
            Command::new("new")
                .about("Create a new configuration interactively")
                .arg(Arg::new("structure").required(true).help("Structure name, short or qualified"))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .default_value("config.yaml")
                        .value_parser(value_parser!(PathBuf))
                        .help("Where to save the configuration"),
                )
                .arg(answers.clone()),
        )
        .subcommand(
            Command::new("edit")
                .about("Edit an existing configuration, seeded from its values")
                .arg(Arg::new("config").required(true).value_parser(value_parser!(PathBuf)))
                .arg(
                    Arg::new("output")
                        .long("output")
                        .short('o')
                        .value_parser(value_parser!(PathBuf))
                        .help("Save elsewhere instead of overwriting the input"),
                )
                .arg(answers),
        )
        .subcommand(
            Command::new("validate")
                .about("Validate a configuration file")
                .arg(Arg::new("config").required(true).value_parser(value_parser!(PathBuf)))
                .arg(
                    Arg::new("model")
                        .long("model")
                        .short('m')
                        .help("Structure to validate against when the file has no metadata"),
                ),
        )
        .subcommand(
            Command::new("show-schema")
                .about("Show the fields of a structure")
                .arg(Arg::new("structure").required(true)),
        )
        .subcommand(Command::new("list").about("List the structures in the schema"))
}

fn init_tracing(verbosity: u8) {
    let level = match verbosity {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn prompter(answers: Option<&PathBuf>) -> anyhow::Result<Box<dyn Prompter>> {
    match answers {
        Some(path) => {
            let script = fs::read_to_string(path)
                .with_context(|| format!("Failed to read answers from {}", path.display()))?;
            Ok(Box::new(ScriptedPrompter::from_script(&script)))
        }
        None => Ok(Box::new(TerminalPrompter::new(io::stdin().lock(), io::stdout()))),
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<u8> {
    let mode = if matches.get_flag("closed-world") { ResolverMode::Closed } else { ResolverMode::Open };
    let options = EngineOptions::new()
        .with_mode(mode)
        .with_max_repair_rounds(matches.get_one::<usize>("max-repair-rounds").copied());

    let registry = HandlerRegistry::with_defaults();
    let schema = matches
        .get_one::<PathBuf>("schema")
        .context("--schema is required")?;
    let catalog = SchemaLoader::new(&registry).with_mode(mode).load(schema)?;
    let session = Session::new(&catalog, &registry).with_options(options);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    let outcome = match matches.subcommand() {
        Some(("new", args)) => {
            let structure = args.get_one::<String>("structure").context("missing structure")?;
            let output = args.get_one::<PathBuf>("output").context("missing output")?;
            let mut prompter = prompter(args.get_one::<PathBuf>("answers"))?;
            session.new_config(structure, output, prompter.as_mut(), &mut out)?
        }
        Some(("edit", args)) => {
            let config = args.get_one::<PathBuf>("config").context("missing config")?;
            let output = args.get_one::<PathBuf>("output").map(PathBuf::as_path);
            let mut prompter = prompter(args.get_one::<PathBuf>("answers"))?;
            session.edit_config(config, output, prompter.as_mut(), &mut out)?
        }
        Some(("validate", args)) => {
            let config = args.get_one::<PathBuf>("config").context("missing config")?;
            let model = args.get_one::<String>("model").map(String::as_str);
            session.validate(config, model, &mut out)?
        }
        Some(("show-schema", args)) => {
            let structure = args.get_one::<String>("structure").context("missing structure")?;
            session.show_schema(structure, &mut out)?
        }
        Some(("list", _)) => session.list(&mut out)?,
        Some((other, _)) => anyhow::bail!("unknown command '{other}'"),
        None => anyhow::bail!("no command given"),
    };
    out.flush()?;
    tracing::debug!(?outcome, schema = %schema.display(), "command finished");
    Ok(outcome.exit_code())
}

fn main() -> ExitCode {
    let matches = cli().get_matches();
    init_tracing(matches.get_count("verbose"));

    match run(&matches) {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            eprintln!("{} {e:#}", "Error:".red().bold());
            ExitCode::FAILURE
        }
    }
}
