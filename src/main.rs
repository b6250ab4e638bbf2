use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use dbbrowse_cli::chinook;
use dbbrowse_cli::config::Config;
use dbbrowse_cli::console::Console;
use dbbrowse_cli::db::{Database, Value};
use dbbrowse_cli::sakila;
use std::io::{self, Write};
use std::path::Path;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dbbrowse")]
#[command(about = "Browse the Sakila and Chinook SQLite sample databases", long_about = None)]
struct Cli {
    /// Log database activity to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive customer and rental menu over the Sakila database
    Sakila {
        /// Saved database name or path to the database file
        #[arg(long)]
        db: Option<String>,
    },
    /// List every artist in the Chinook database
    Artists {
        #[arg(long)]
        db: Option<String>,
    },
    /// Print every album with its artist id
    Albums {
        #[arg(long)]
        db: Option<String>,
    },
    /// Run a query with positional `?` parameters and print the rows
    Query {
        /// SQL statement to run
        sql: String,
        /// Value for the next `?` placeholder (repeatable)
        #[arg(short, long = "param")]
        params: Vec<String>,
        /// Page through the rows and print the selected one
        #[arg(long)]
        page: bool,
        #[arg(long)]
        db: Option<String>,
    },
    /// Save a database file under a short name
    #[command(alias = "add")]
    AddDb {
        /// Name to save the database under
        name: String,
        /// Path to the database file
        path: String,
    },
    /// List all saved databases
    #[command(alias = "ls")]
    ListDbs,
    /// Remove a saved database
    #[command(alias = "rm")]
    RemoveDb {
        /// Name of the database to remove
        name: String,
    },
    /// Generate shell completions
    #[command(alias = "gen-completions")]
    Completions {
        /// Shell type for completions
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match &cli.command {
        Commands::Sakila { db } => {
            let path = saved_databases().resolve_or(db.as_deref(), "sakila", "sakila.db");
            run_sakila(&path)?;
        }
        Commands::Artists { db } => {
            let path = saved_databases().resolve_or(db.as_deref(), "chinook", "chinook.db");
            list_artists(&path)?;
        }
        Commands::Albums { db } => {
            let path = saved_databases().resolve_or(db.as_deref(), "chinook", "chinook.db");
            list_albums(&path)?;
        }
        Commands::Query {
            sql,
            params,
            page,
            db,
        } => {
            let path = saved_databases().resolve_or(db.as_deref(), "chinook", "chinook.db");
            run_query(&path, sql, params, *page)?;
        }
        Commands::AddDb { name, path } => {
            add_database(name, path)?;
        }
        Commands::ListDbs => {
            list_databases()?;
        }
        Commands::RemoveDb { name } => {
            remove_database(name)?;
        }
        Commands::Completions { shell } => {
            generate_completions(*shell);
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

/// Saved names for resolving `--db`. An unreadable config only loses the
/// saved names; the database commands still run.
fn saved_databases() -> Config {
    Config::load().unwrap_or_else(|e| {
        tracing::debug!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

/// Opens `path` or ends the process with exit code 1.
fn open_or_exit(path: &Path) -> Database {
    match Database::open(path) {
        Ok(db) => db,
        Err(e) => {
            eprintln!("Error in connection: {}", e);
            std::process::exit(1);
        }
    }
}

fn run_sakila(path: &Path) -> Result<()> {
    let db = open_or_exit(path);
    println!("Welcome to Sakila");

    let mut console = Console::stdio();
    sakila::menu().run(&db, &mut console)?;

    drop(db);
    println!("Database closed. Exiting program.");
    Ok(())
}

fn list_artists(path: &Path) -> Result<()> {
    let db = open_or_exit(path);
    match chinook::artists(&db) {
        Ok(artists) => {
            let mut stdout = io::stdout().lock();
            chinook::print_artists(&mut stdout, &artists)?;
            stdout.flush()?;
        }
        Err(e) => {
            eprintln!("{:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn list_albums(path: &Path) -> Result<()> {
    let db = open_or_exit(path);
    println!("Opened Database Successfully!");

    match chinook::albums(&db) {
        Ok(rows) => {
            let mut stdout = io::stdout().lock();
            chinook::print_rows(&mut stdout, &rows)?;
            writeln!(stdout, "Operation OK!")?;
        }
        Err(e) => {
            eprintln!("Error!  {:#}", e);
            std::process::exit(1);
        }
    }
    Ok(())
}

fn run_query(path: &Path, sql: &str, params: &[String], page: bool) -> Result<()> {
    let db = open_or_exit(path);
    let params: Vec<Value> = params.iter().map(|p| Value::parse_param(p)).collect();

    let rows = match chinook::run_query(&db, sql, &params) {
        Ok(rows) => rows,
        Err(e) => {
            eprintln!("Error!  {:#}", e);
            std::process::exit(1);
        }
    };

    if page {
        let mut console = Console::stdio();
        chinook::browse_rows(&mut console, &rows)?;
    } else {
        let mut stdout = io::stdout().lock();
        chinook::print_rows(&mut stdout, &rows)?;
    }
    Ok(())
}

fn add_database(name: &str, path: &str) -> Result<()> {
    let mut config = Config::load_saved()?;
    config.add_database(name, path);
    config.save()?;

    println!("Database '{}' saved as {}", name, path);
    Ok(())
}

fn list_databases() -> Result<()> {
    let config = Config::load()?;
    let databases = config.list_databases();

    if databases.is_empty() {
        println!("No saved databases found.");
    } else {
        println!("Saved databases:");
        for (name, path) in databases {
            println!("- {} ({})", name, path.display());
        }
    }

    Ok(())
}

fn remove_database(name: &str) -> Result<()> {
    let mut config = Config::load_saved()?;

    if config.remove_database(name) {
        config.save()?;
        println!("Database '{}' removed successfully!", name);
    } else {
        eprintln!("Database '{}' not found.", name);
        std::process::exit(1);
    }

    Ok(())
}

fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
}
