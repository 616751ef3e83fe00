use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use phonebook_lib::{
    config::{AppPaths, LogSettings},
    export, logging,
    shell::Shell,
    Contact, ContactForm, ContactStore,
};

#[derive(Debug, Parser)]
#[command(name = "phonebook", about = "Phone book contact manager", version)]
struct Cli {
    /// Use this database file instead of the one in the application data directory.
    #[arg(long, value_name = "PATH", global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print every contact in id order.
    List {
        /// Emit the contacts as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Print contacts whose name or phone contains TERM.
    Search {
        term: String,
        /// Emit the matches as a JSON array.
        #[arg(long)]
        json: bool,
    },
    /// Write every contact to a CSV file.
    Export {
        #[arg(value_name = "PATH")]
        path: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            process::exit(1);
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let paths = AppPaths::resolve(cli.db.as_deref()).context("resolve application paths")?;
    let _logging = logging::init_logging(Some(&paths.logs_dir), &LogSettings::from_env())
        .context("initialize logging")?;
    tracing::debug!(target: "phonebook", event = "app_booted", db = %paths.db_path.display());

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;

    runtime.block_on(async move {
        let store = open_store(&paths.db_path).await?;
        match cli.command {
            None => run_interactive(store).await,
            Some(command) => {
                let result = handle_command(&store, command).await;
                store.close().await;
                result
            }
        }
    })
}

async fn open_store(db_path: &Path) -> Result<ContactStore> {
    ContactStore::open(db_path)
        .await
        .with_context(|| format!("open contact database at {}", db_path.display()))
}

async fn run_interactive(store: ContactStore) -> Result<i32> {
    let form = ContactForm::new(store);
    let shell = Shell::new(form, std::io::stdin().lock(), std::io::stdout());
    let form = shell.run().await.context("run contact form")?;
    form.close().await;
    Ok(0)
}

async fn handle_command(store: &ContactStore, command: Commands) -> Result<i32> {
    match command {
        Commands::List { json } => {
            let contacts = store.list_all().await.context("list contacts")?;
            print_contacts(&contacts, json)?;
            Ok(0)
        }
        Commands::Search { term, json } => {
            if term.trim().is_empty() {
                eprintln!("Please enter a search term.");
                return Ok(2);
            }
            let contacts = store
                .search(term.trim())
                .await
                .context("search contacts")?;
            if contacts.is_empty() && !json {
                println!("No contacts found.");
            } else {
                print_contacts(&contacts, json)?;
            }
            Ok(0)
        }
        Commands::Export { path } => {
            if store.count().await.context("count contacts")? == 0 {
                eprintln!("There are no contacts to export.");
                return Ok(1);
            }
            let path = export::with_csv_extension(path);
            let written = export::export_contacts(store, &path)
                .await
                .with_context(|| format!("export contacts to {}", path.display()))?;
            println!("Exported {written} contacts to {}", path.display());
            Ok(0)
        }
    }
}

fn print_contacts(contacts: &[Contact], json: bool) -> Result<()> {
    if json {
        let serialized = export::render_json(contacts).context("serialize contacts")?;
        println!("{serialized}");
    } else {
        for contact in contacts {
            println!("{}", contact.display_line());
        }
    }
    Ok(())
}
