use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use lendshelf_app::{App, Book, LendingError, Notice};
use lendshelf_kernel::settings::Settings;

#[derive(Parser)]
#[command(name = "lendshelf", version, about = "Browse, borrow and return books")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// List the catalog
    Books,
    /// Show one book
    Show { id: String },
    /// Borrow a book
    Borrow { id: String },
    /// Return a borrowed book
    Return { book_id: String },
    /// List borrowed books
    Borrowed,
    /// Load catalog entries from a JSON array of books
    Seed { file: PathBuf },
    /// Print every snapshot of a collection until interrupted
    Watch {
        #[arg(value_enum)]
        collection: WatchTarget,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum WatchTarget {
    Books,
    Borrowed,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LendingError>() {
                Some(lending) => eprintln!("{}", lending.notice()),
                None => eprintln!("error: {err:#}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load lendshelf settings")?;
    lendshelf_telemetry::init_stderr(&settings.telemetry);

    tracing::debug!(env = ?settings.environment, store = ?settings.store.backend, "lendshelf CLI starting");

    let app = App::build(settings).await?;
    let lending = &app.lending;

    match cli.command {
        Command::Serve => app.serve().await?,
        Command::Books => {
            for book in lending.list_books().await? {
                print_book_line(&book);
            }
        }
        Command::Show { id } => {
            let book = lending.fetch_book(&id).await?;
            println!("{}", serde_json::to_string_pretty(&book)?);
        }
        Command::Borrow { id } => {
            let book = lending.fetch_book(&id).await?;
            lending.borrow(&book).await?;
            println!("{}", Notice::borrowed());
        }
        Command::Return { book_id } => {
            lending.return_book(&book_id).await?;
            println!("{}", Notice::returned());
        }
        Command::Borrowed => {
            let records = lending.list_borrowed().await?;
            if records.is_empty() {
                println!("You haven't borrowed any books yet.");
            }
            for record in records {
                println!("{}\t{} by {}", record.book_id, record.name, record.author);
            }
        }
        Command::Seed { file } => {
            let raw = tokio::fs::read(&file)
                .await
                .with_context(|| format!("failed to read {}", file.display()))?;
            let books: Vec<Book> = serde_json::from_slice(&raw)
                .with_context(|| format!("{} is not a JSON array of books", file.display()))?;
            let count = lending.seed_books(&books).await?;
            println!("seeded {count} books");
        }
        Command::Watch { collection } => watch(&app, collection).await?,
    }

    Ok(())
}

fn print_book_line(book: &Book) {
    let status = if book.is_borrowed {
        "Currently Borrowed"
    } else {
        "Available"
    };
    println!("{}\t{} by {}\t{}", book.id, book.name, book.author, status);
}

async fn watch(app: &App, target: WatchTarget) -> anyhow::Result<()> {
    match target {
        WatchTarget::Books => {
            let mut view = app.lending.watch_catalog().await?;
            loop {
                tokio::select! {
                    snapshot = view.next() => {
                        let Some(snapshot) = snapshot else { break };
                        println!("-- books v{} ({} entries)", snapshot.version, snapshot.len());
                        for book in &snapshot.items {
                            print_book_line(book);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
        WatchTarget::Borrowed => {
            let mut view = app.lending.watch_borrowed().await?;
            loop {
                tokio::select! {
                    snapshot = view.next() => {
                        let Some(snapshot) = snapshot else { break };
                        println!("-- borrowed v{} ({} entries)", snapshot.version, snapshot.len());
                        for record in &snapshot.items {
                            println!("{}\t{} by {}", record.book_id, record.name, record.author);
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}
