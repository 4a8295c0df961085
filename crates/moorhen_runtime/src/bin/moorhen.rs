//! Moorhen console entry point.

use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use moorhen_foundation::ObjectId;
use moorhen_runtime::{
    BootstrapFile, BootstrapLoader, CommandDispatcher, Console, ConsoleConnection, RuntimeConfig,
    RustylineEditor, ScriptHost, core_world, spawn_player,
};
use moorhen_storage::{Database, DocumentStore, MemoryStore, World};
use tracing::info;

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    config: Option<PathBuf>,
    world: Option<PathBuf>,
    bootstrap: Vec<PathBuf>,
    name: Option<String>,
    show_help: bool,
    show_version: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = env::args().collect();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();
    let mut args = args.into_iter().skip(1);
    while let Some(arg) = args.next() {
        let mut value = |flag: &str| {
            args.next()
                .ok_or_else(|| format!("{flag} requires a value"))
        };
        match arg.as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-c" | "--config" => config.config = Some(PathBuf::from(value("--config")?)),
            "-w" | "--world" => config.world = Some(PathBuf::from(value("--world")?)),
            "-l" | "--load" => config.bootstrap.push(PathBuf::from(value("--load")?)),
            "-n" | "--name" => config.name = Some(value("--name")?),
            other => return Err(format!("unknown option: {other}").into()),
        }
    }
    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = parse_args(args)?;
    if cli.show_help {
        print_help();
        return Ok(());
    }
    if cli.show_version {
        println!("moorhen {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let config = match &cli.config {
        Some(path) => RuntimeConfig::from_json_file(path)?,
        None => RuntimeConfig::default(),
    };

    let store = match &cli.world {
        Some(path) if path.exists() => Arc::new(MemoryStore::load_from_file(path)?),
        _ => Arc::new(MemoryStore::new()),
    };
    let db = Database::open(Arc::clone(&store) as Arc<dyn DocumentStore>, config.seed)?;
    let core = core_world(&db)?;
    for path in &cli.bootstrap {
        let file = BootstrapFile::from_file(path)?;
        BootstrapLoader::new()
            .overwrite(true)
            .with_system(Some(core.system))
            .load_into(&db, &file)?;
    }

    let name = cli.name.unwrap_or_else(|| "Wizard".to_string());
    let player = match db.read(|w| find_player(w, &name)) {
        Some(player) => player,
        None => spawn_player(&db, &name, true)?,
    };

    let host = Arc::new(ScriptHost::new(db, config));
    let dispatcher = CommandDispatcher::new(Arc::clone(&host));
    let mut session = dispatcher.connect(player, Arc::new(ConsoleConnection::new()));
    Console::new(&dispatcher, RustylineEditor::new()?).run(&mut session)?;

    if let Some(path) = &cli.world {
        store.save_to_file(path)?;
        info!(path = %path.display(), "world saved");
    }
    Ok(())
}

fn find_player(world: &World, name: &str) -> Option<ObjectId> {
    let class = world.class_by_name("player")?.id;
    world
        .instances_of(class, true)
        .into_iter()
        .find(|id| world.display_name(*id).eq_ignore_ascii_case(name))
}

fn print_help() {
    println!(
        "\x1b[1mMoorhen\x1b[0m - Multi-user object world with scripted verbs

\x1b[1mUSAGE:\x1b[0m
    moorhen [OPTIONS]

\x1b[1mOPTIONS:\x1b[0m
    -h, --help           Print help information
    -V, --version        Print version information
    -c, --config PATH    Runtime configuration (JSON)
    -w, --world PATH     World snapshot to load, saved again on exit
    -l, --load PATH      Bootstrap verbs and functions (JSON, repeatable)
    -n, --name NAME      Play as NAME (default: Wizard)

\x1b[1mENVIRONMENT:\x1b[0m
    RUST_LOG             Log filter (default: info)

\x1b[1mCOMMANDS:\x1b[0m
    look, inventory, take <thing>, drop <thing>, say <text>, north, ...
    help                 List built-in commands
    @eval <code>         Run code
    @program #N:verb     Replace a verb's code
    quit                 Leave"
    );
}
