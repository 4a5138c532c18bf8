use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use filesieve::console::ConsolePresenter;
use filesieve::filter::{SortColumn, TypeFilter};
use filesieve::logging::{self, LogTarget};
use filesieve::preview;
use filesieve::session::Session;
use filesieve::settings::Settings;
use filesieve::ui::App;

#[derive(Parser)]
#[command(name = "filesieve")]
#[command(about = "Filter a folder's contents and delete, rename or copy them in bulk", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to settings file
    #[arg(short = 'c', long, global = true)]
    config: Option<String>,

    /// Write logs to this file
    #[arg(long, global = true)]
    log_file: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive TUI
    Browse {
        /// Folder to open (defaults to the current directory)
        dir: Option<PathBuf>,
    },
    /// Print the filtered, sorted contents of a folder
    List {
        dir: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Delete every item matching the filter
    Delete {
        dir: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        /// Don't ask for confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Rename every item matching the filter
    Rename {
        dir: PathBuf,
        /// Text or regex to replace in each name
        #[arg(long)]
        from: String,
        /// Replacement; regex mode accepts $1-style groups
        #[arg(long)]
        to: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        yes: bool,
    },
    /// Copy every item matching the filter into another folder
    Copy {
        dir: PathBuf,
        /// Destination folder
        #[arg(long)]
        dest: PathBuf,
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the first part of a file as text
    Preview { file: PathBuf },
}

#[derive(Args, Clone)]
struct FilterArgs {
    /// Include everything below the folder
    #[arg(short, long)]
    recursive: bool,
    /// Name pattern
    #[arg(short, long)]
    pattern: Option<String>,
    /// Treat the pattern as a regular expression
    #[arg(long)]
    regex: bool,
    #[arg(long)]
    case_sensitive: bool,
    #[arg(long, value_enum)]
    show: Option<TypeFilter>,
    #[arg(long, value_enum)]
    sort: Option<SortColumn>,
    #[arg(long)]
    reverse: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = match &cli.config {
        Some(config) => PathBuf::from(shellexpand::tilde(config).to_string()),
        None => Settings::default_path(),
    };
    let settings = Settings::load(&settings_path).context("Failed to load settings")?;

    let log_file = cli
        .log_file
        .as_deref()
        .map(|p| PathBuf::from(shellexpand::tilde(p).to_string()))
        .or_else(|| settings.log.file.clone());

    match cli.command {
        None => run_tui(&settings, None, log_file).await?,
        Some(Commands::Browse { dir }) => run_tui(&settings, dir, log_file).await?,
        Some(command) => {
            let target = match log_file {
                Some(path) => LogTarget::File(path),
                None => LogTarget::Stderr,
            };
            logging::init(&settings.log, target)?;
            run_command(command, &settings)?;
        }
    }

    Ok(())
}

async fn run_tui(settings: &Settings, dir: Option<PathBuf>, log_file: Option<PathBuf>) -> Result<()> {
    // The TUI owns the terminal, so logs only go to a file
    let target = match log_file {
        Some(path) => LogTarget::File(path),
        None => LogTarget::Off,
    };
    logging::init(&settings.log, target)?;

    let dir = match dir {
        Some(dir) => dir,
        None => std::env::current_dir().context("Failed to read current directory")?,
    };

    let mut session = Session::new(settings);
    session
        .browse(&dir)
        .with_context(|| format!("Failed to open {}", dir.display()))?;

    let mut app = App::new(session);
    app.run().await
}

fn run_command(command: Commands, settings: &Settings) -> Result<()> {
    match command {
        Commands::Browse { dir } => {
            bail!("browse {:?} must run in the TUI", dir);
        }
        Commands::List { dir, filter, json } => {
            let session = open_session(settings, &dir, &filter)?;
            if json {
                let items = session.visible();
                println!("{}", serde_json::to_string_pretty(&items)?);
            } else {
                print_table(&session);
            }
        }
        Commands::Delete { dir, filter, yes } => {
            let mut session = open_session(settings, &dir, &filter)?;
            session.select_all();
            let mut presenter = console_presenter(yes);
            session.delete_selected(&mut presenter);
        }
        Commands::Rename {
            dir,
            from,
            to,
            filter,
            yes,
        } => {
            let mut session = open_session(settings, &dir, &filter)?;
            session.select_all();
            let mut presenter = console_presenter(yes);
            session.rename_selected(&mut presenter, &from, &to);
        }
        Commands::Copy {
            dir,
            dest,
            filter,
            yes,
        } => {
            if !dest.is_dir() {
                bail!("Destination is not a folder: {}", dest.display());
            }
            let mut session = open_session(settings, &dir, &filter)?;
            session.select_all();
            let mut presenter = console_presenter(yes).with_destination(dest);
            session.copy_selected(&mut presenter);
        }
        Commands::Preview { file } => {
            let preview = preview::preview(&file)
                .with_context(|| format!("Cannot preview file: {}", file.display()))?;
            let mut stdout = io::stdout();
            stdout.write_all(preview.text.as_bytes())?;
            writeln!(stdout)?;
        }
    }
    Ok(())
}

fn console_presenter(yes: bool) -> ConsolePresenter<io::StdinLock<'static>, io::Stdout> {
    ConsolePresenter::new(io::stdin().lock(), io::stdout()).assume_yes(yes)
}

/// Scan `dir` and apply the command line filter on top of the settings
fn open_session(settings: &Settings, dir: &Path, args: &FilterArgs) -> Result<Session> {
    let mut settings = settings.clone();
    if args.recursive {
        settings.browse.recursive = true;
    }
    if args.regex {
        settings.filter.use_regex = true;
    }
    if args.case_sensitive {
        settings.filter.case_sensitive = true;
    }
    if let Some(show) = args.show {
        settings.browse.show = show;
    }
    if let Some(sort) = args.sort {
        settings.browse.sort = sort;
    }
    if args.reverse {
        settings.browse.sort_reverse = true;
    }

    let mut session = Session::new(&settings);
    session
        .browse(dir)
        .with_context(|| format!("Failed to open {}", dir.display()))?;

    let pattern = args.pattern.clone().unwrap_or_default();
    if !session.update_filter(|f| f.pattern = pattern) {
        bail!("{}", session.status());
    }
    Ok(session)
}

fn print_table(session: &Session) {
    let items = session.visible();
    if items.is_empty() {
        println!("No matching items.");
        return;
    }

    println!(
        "{:<6} {:<40} {:>12} {:<16}",
        "Type", "Name", "Size", "Modified"
    );
    println!("{}", "-".repeat(78));
    for item in &items {
        let name = if session.is_recursive() {
            item.path
                .strip_prefix(session.catalog().root())
                .unwrap_or(&item.path)
                .display()
                .to_string()
        } else {
            item.name.clone()
        };
        println!(
            "{:<6} {:<40} {:>12} {:<16}",
            item.kind.label(),
            name,
            item.size_display(),
            item.modified_display()
        );
    }
    println!();
    println!("{}", session.status());
}
