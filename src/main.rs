//! Recall CLI - personal reminders from the terminal.

use chrono::Local;
use clap::Parser;
use recall::cli::{Cli, Commands, ConfigCommands, FieldArgs};
use recall::commands::{self, AddInput, DueWindow, ListOptions, Output, UpdateInput};
use recall::config::{self, ConfigOverrides, OutputFormat, ResolvedConfig};
use recall::logging;
use std::process;

fn main() {
    let cli = Cli::parse();
    logging::init();

    // Until config is resolved, only the flag decides the error format.
    let mut human = cli.human_readable;

    let result = load_config(&cli).and_then(|resolved| {
        human = resolved.output_format() == OutputFormat::Human;
        run_command(cli.command, &resolved, human)
    });

    if let Err(e) = result {
        if human {
            eprintln!("Error: {}", e);
        } else {
            eprintln!("{}", serde_json::json!({ "error": e.to_string() }));
        }
        process::exit(1);
    }
}

fn load_config(cli: &Cli) -> Result<ResolvedConfig, recall::Error> {
    let home = config::recall_home()?;
    config::load_env_file(&home);

    let mut overrides = ConfigOverrides::new();
    if let Some(backend) = cli.backend {
        overrides = overrides.with_backend(backend);
    }
    if cli.human_readable {
        overrides = overrides.with_output_format(OutputFormat::Human);
    }
    config::resolve_config(&home, &overrides)
}

fn run_command(command: Commands, resolved: &ResolvedConfig, human: bool) -> Result<(), recall::Error> {
    // `config show` must work even when the backend cannot be opened.
    let backend = || config::open_backend(resolved);
    let now = Local::now();

    match command {
        Commands::Add { title, fields } => {
            let FieldArgs {
                due,
                note,
                links,
                tags,
                priority,
            } = fields;
            let input = AddInput {
                title,
                due,
                notes: note,
                links,
                tags,
                priority,
            };
            output(&commands::add(&backend()?, input, now)?, human);
        }

        Commands::List {
            today,
            tomorrow,
            week,
            tags,
            all,
            completed,
            search,
            ids,
        } => {
            let window = if today {
                Some(DueWindow::Today)
            } else if tomorrow {
                Some(DueWindow::Tomorrow)
            } else if week {
                Some(DueWindow::Week)
            } else {
                None
            };
            let options = ListOptions {
                window,
                tags,
                all,
                completed_only: completed,
                search,
                show_ids: ids,
            };
            output(&commands::list(&backend()?, &options, now)?, human);
        }

        Commands::Show { id } => output(&commands::show(&backend()?, &id)?, human),

        Commands::Update { id, title, fields } => {
            let input = UpdateInput {
                title,
                due: fields.due,
                notes: fields.note,
                links: fields.links,
                tags: fields.tags,
                priority: fields.priority,
            };
            output(&commands::update(&backend()?, &id, input, now)?, human);
        }

        Commands::Complete { id } => output(&commands::complete(&backend()?, &id)?, human),

        Commands::Delete { id } => output(&commands::delete(&backend()?, &id)?, human),

        Commands::Compact => output(&commands::compact(&backend()?)?, human),

        Commands::Config {
            command: ConfigCommands::Show,
        } => output(&commands::config_show(resolved), human),
    }

    Ok(())
}

fn output<T: Output>(result: &T, human: bool) {
    if human {
        println!("{}", result.to_human());
    } else {
        println!("{}", result.to_json());
    }
}
