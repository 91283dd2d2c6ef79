//! lazyrun CLI — save shell commands as shortcuts and run them by name.
//!
//! Commands: save, list, remove, tag, group, completions, and a bare
//! `<name>` that runs a saved shortcut.

mod commands;
mod logging;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};

use lazyrun_core::LazyrunError;
use lazyrun_store::{ShellRunner, ShortcutStore, StoreConfig};

const ASCII_BANNER: &str = r"
  _
 | |
 | | __ _ _____   _ _ __ _   _ _ __
 | |/ _` |_  / | | | '__| | | | '_ \
 | | (_| |/ /| |_| | |  | |_| | | | |
 |_|\__,_/___|\__, |_|   \__,_|_| |_|
               __/ |
              |___/
";

#[derive(Parser)]
#[command(name = "lazyrun")]
#[command(version)]
#[command(about = "LazyRun: Shortcut your commands.")]
struct Cli {
    /// Shortcut store file [default: $LAZYRUN_STORE or the user config directory]
    #[arg(long, global = true, value_name = "PATH")]
    store: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Save a command as a shortcut
    Save {
        /// Shortcut name
        name: String,
        /// The shell command to save (wrap in quotes if needed)
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        cmd: Vec<String>,
    },
    /// List all saved shortcuts
    List {
        /// Print the shortcuts as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove a saved shortcut
    Remove {
        /// Name of the shortcut to remove
        name: String,
    },
    /// Manage and run tags
    #[command(subcommand)]
    Tag(TagCommand),
    /// Manage and run ordered groups
    #[command(subcommand)]
    Group(GroupCommand),
    /// Print a shell completion script
    Completions {
        shell: clap_complete::Shell,
    },
    /// Run a saved shortcut by name
    #[command(external_subcommand)]
    Run(Vec<String>),
}

#[derive(clap::Subcommand)]
enum TagCommand {
    /// Tag a shortcut
    Add { name: String, tag: String },
    /// Remove a tag from a shortcut
    Remove { name: String, tag: String },
    /// List the tags of a shortcut
    List { name: String },
    /// Run every shortcut carrying a tag
    Run {
        tag: String,
        /// Run one at a time, waiting for each to finish
        #[arg(long)]
        wait: bool,
    },
}

#[derive(clap::Subcommand)]
enum GroupCommand {
    /// Add a shortcut to a group
    Add {
        name: String,
        group: String,
        /// Position in the group (0 runs first); appended when omitted
        #[arg(long, allow_negative_numbers = true)]
        priority: Option<i64>,
    },
    /// Remove a shortcut from a group
    Remove { name: String, group: String },
    /// List the members of a group, or every group
    List { group: Option<String> },
    /// Run the members of a group in order
    Run { group: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("✘ | {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let Some(command) = cli.command else {
        print_splash();
        return Ok(ExitCode::SUCCESS);
    };

    if let Commands::Completions { shell } = command {
        clap_complete::generate(shell, &mut Cli::command(), "lazyrun", &mut std::io::stdout());
        return Ok(ExitCode::SUCCESS);
    }

    if let Commands::Save { name, .. } = &command {
        if is_subcommand_name(name) {
            eprintln!("✘ | '{name}' clashes with a lazyrun command and cannot be used as a shortcut name.");
            return Ok(ExitCode::from(2));
        }
    }

    let store = ShortcutStore::open(&StoreConfig::resolve(cli.store));
    tracing::debug!(path = %store.path().display(), "using shortcut store");
    let runner = commands::Announcing(ShellRunner::from_env());

    let result = match command {
        Commands::Save { name, cmd } => commands::save(&store, &name, &cmd.join(" ")),
        Commands::List { json } => commands::list(&store, json),
        Commands::Remove { name } => commands::remove(&store, &name),
        Commands::Tag(TagCommand::Add { name, tag }) => commands::tag_add(&store, &name, &tag),
        Commands::Tag(TagCommand::Remove { name, tag }) => {
            commands::tag_remove(&store, &name, &tag)
        }
        Commands::Tag(TagCommand::List { name }) => commands::tag_list(&store, &name),
        Commands::Tag(TagCommand::Run { tag, wait }) => {
            commands::tag_run(&store, &tag, wait, &runner)
        }
        Commands::Group(GroupCommand::Add {
            name,
            group,
            priority,
        }) => commands::group_add(&store, &name, &group, priority),
        Commands::Group(GroupCommand::Remove { name, group }) => {
            commands::group_remove(&store, &name, &group)
        }
        Commands::Group(GroupCommand::List { group }) => {
            commands::group_list(&store, group.as_deref())
        }
        Commands::Group(GroupCommand::Run { group }) => {
            commands::group_run(&store, &group, &runner)
        }
        Commands::Run(args) => match args.first() {
            Some(name) => commands::run_shortcut(&store, name, &runner),
            None => Ok(()),
        },
        Commands::Completions { .. } => Ok(()),
    };

    match result {
        Ok(()) => Ok(ExitCode::SUCCESS),
        Err(LazyrunError::NotFound(not_found)) => {
            println!("✘ | {not_found}");
            Ok(ExitCode::SUCCESS)
        }
        Err(LazyrunError::InvalidName(name)) => {
            eprintln!("✘ | '{name}' cannot be used as a shortcut name.");
            Ok(ExitCode::from(2))
        }
        Err(e) => Err(e.into()),
    }
}

/// Bare `lazyrun <name>` only reaches a shortcut when `name` is not
/// claimed by a subcommand (or its alias) first.
fn is_subcommand_name(name: &str) -> bool {
    name == "help"
        || Cli::command()
            .get_subcommands()
            .any(|sub| sub.get_name() == name || sub.get_all_aliases().any(|a| a == name))
}

fn print_splash() {
    println!("{ASCII_BANNER}");
    println!("lazyrun – Task Runner With Memory");
    println!("Save and run your most-used shell commands as easy shortcuts.");
    println!();
    println!("Example:");
    println!("  lazyrun save build \"cargo build --release\"");
    println!("  lazyrun build");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subcommand_names_are_reserved() {
        for name in ["save", "list", "remove", "tag", "group", "completions", "help"] {
            assert!(is_subcommand_name(name), "{name} should be reserved");
        }
        assert!(!is_subcommand_name("build"));
        assert!(!is_subcommand_name("List"));
    }

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }
}
