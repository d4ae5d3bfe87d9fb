mod app;
mod ui;

use anyhow::Result;
use app::{App, Focus};
use book_package_config::Config;
use book_package_engine::{Door43Client, ResourceId, ResourceStore, SyncEvent, sync_resources};
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};
use std::{
    env,
    io::{Stdout, stdout},
    path::PathBuf,
    process,
};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Sync,
    Read {
        book: Option<String>,
        chapter: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Args {
    data_dir: Option<PathBuf>,
    command: Command,
}

fn parse_args(args: &[String]) -> Result<Args, String> {
    let mut data_dir = None;
    let mut rest = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--data-dir" {
            let path = iter.next().ok_or("--data-dir needs a path")?;
            data_dir = Some(PathBuf::from(path));
        } else if arg.starts_with("--") {
            return Err(format!("Unknown option {arg}"));
        } else {
            rest.push(arg.as_str());
        }
    }

    let command = match rest.as_slice() {
        [] => Command::Read {
            book: None,
            chapter: None,
        },
        ["sync"] => Command::Sync,
        ["read", positional @ ..] if positional.len() <= 2 => Command::Read {
            book: positional.first().map(|s| s.to_string()),
            chapter: positional.get(1).map(|s| s.to_string()),
        },
        _ => return Err(format!("Unexpected arguments: {}", rest.join(" "))),
    };

    Ok(Args { data_dir, command })
}

fn usage(program: &str) -> String {
    format!("Usage: {program} [--data-dir PATH] [sync | read [BOOK [CHAPTER]]]")
}

fn main() -> Result<()> {
    let args: Vec<String> = env::args().collect();
    let program = args.first().map(String::as_str).unwrap_or("book-package-reader");

    let parsed = match parse_args(args.get(1..).unwrap_or(&[])) {
        Ok(parsed) => parsed,
        Err(e) => {
            eprintln!("Error: {e}");
            eprintln!("{}", usage(program));
            process::exit(2);
        }
    };

    init_logging(&parsed.command);

    let mut config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!(
                "No config file at {}, using defaults",
                Config::config_path().display()
            );
            Config::default()
        }
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };
    if let Some(data_dir) = parsed.data_dir {
        config.data_dir = data_dir;
    }

    match parsed.command {
        Command::Sync => run_sync(&config),
        Command::Read { book, chapter } => run_reader(config, book.as_deref(), chapter.as_deref()),
    }
}

/// The reader owns the terminal, so it only logs when `RUST_LOG` asks.
fn init_logging(command: &Command) {
    let default_level = match command {
        Command::Sync => log::LevelFilter::Info,
        Command::Read { .. } => log::LevelFilter::Off,
    };
    env_logger::Builder::new()
        .filter_level(default_level)
        .parse_default_env()
        .init();
}

fn run_sync(config: &Config) -> Result<()> {
    let store = ResourceStore::new(&config.data_dir);
    let client = Door43Client::new(&config.api_base)?;
    let ids: Vec<ResourceId> = config
        .resources
        .iter()
        .map(|r| ResourceId::new(&r.owner, &r.repo))
        .collect();

    println!("Syncing {} resources into {}", ids.len(), store.root().display());
    let report = sync_resources(&store, &client, &ids, print_sync_event);

    if report.has_failures() {
        process::exit(1);
    }
    Ok(())
}

fn print_sync_event(event: &SyncEvent) {
    match event {
        SyncEvent::Checking(id) => println!("{id}: checking"),
        SyncEvent::Downloading { id, version } => println!("{id}: downloading {version}"),
        SyncEvent::Extracting { id } => println!("{id}: extracting"),
        SyncEvent::UpToDate { id, version } => println!("{id}: up to date ({version})"),
        SyncEvent::Updated { id, version } => println!("{id}: updated to {version}"),
        SyncEvent::Skipped { id } => println!("{id}: no release, skipped"),
        SyncEvent::Failed { id, message } => eprintln!("{id}: failed: {message}"),
        SyncEvent::Complete { updated, failed } => {
            println!("Done: {updated} updated, {failed} failed")
        }
    }
}

fn run_reader(config: Config, book: Option<&str>, chapter: Option<&str>) -> Result<()> {
    let mut app = App::new(config, book, chapter)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Main loop
    let res = run_app(&mut terminal, &mut app);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}

fn run_app(terminal: &mut Terminal<CrosstermBackend<Stdout>>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui::ui(f, app))?;

        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        if let Some(view) = &mut app.article {
            match key.code {
                KeyCode::Char('q') => return Ok(()),
                KeyCode::Down | KeyCode::Char('j') => view.next_link(),
                KeyCode::Up | KeyCode::Char('k') => view.previous_link(),
                KeyCode::Enter => app.follow_selected_link(),
                KeyCode::Backspace | KeyCode::Esc => app.article_back(),
                _ => {}
            }
            continue;
        }

        match key.code {
            KeyCode::Char('q') => return Ok(()),
            KeyCode::Tab => app.toggle_focus(),
            KeyCode::Down | KeyCode::Char('j') => match app.focus {
                Focus::Books => app.next_book(),
                Focus::Helps => app.next_help(),
            },
            KeyCode::Up | KeyCode::Char('k') => match app.focus {
                Focus::Books => app.previous_book(),
                Focus::Helps => app.previous_help(),
            },
            KeyCode::Enter => match app.focus {
                Focus::Books => {
                    app.open_selected_book();
                    app.focus = Focus::Helps;
                }
                Focus::Helps => app.open_selected_help(),
            },
            KeyCode::Right | KeyCode::Char('l') => app.next_chapter(),
            KeyCode::Left | KeyCode::Char('h') => app.previous_chapter(),
            KeyCode::Char('t') => app.next_tab(),
            KeyCode::Char(']') => app.next_verse_filter(),
            KeyCode::Char('[') => app.previous_verse_filter(),
            KeyCode::Char('a') => app.clear_verse_filter(),
            KeyCode::Char('b') => app.toggle_translation(),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn no_arguments_reads_default_book() {
        let parsed = parse_args(&[]).unwrap();
        assert_eq!(
            parsed,
            Args {
                data_dir: None,
                command: Command::Read {
                    book: None,
                    chapter: None
                }
            }
        );
    }

    #[test]
    fn read_with_book_and_chapter() {
        let parsed = parse_args(&args(&["read", "01-GEN", "2"])).unwrap();
        assert_eq!(
            parsed.command,
            Command::Read {
                book: Some("01-GEN".to_string()),
                chapter: Some("2".to_string())
            }
        );
    }

    #[test]
    fn data_dir_before_or_after_command() {
        let before = parse_args(&args(&["--data-dir", "/tmp/x", "sync"])).unwrap();
        let after = parse_args(&args(&["sync", "--data-dir", "/tmp/x"])).unwrap();

        assert_eq!(before, after);
        assert_eq!(before.data_dir, Some(PathBuf::from("/tmp/x")));
        assert_eq!(before.command, Command::Sync);
    }

    #[test]
    fn bad_arguments() {
        assert!(parse_args(&args(&["--data-dir"])).is_err());
        assert!(parse_args(&args(&["--verbose"])).is_err());
        assert!(parse_args(&args(&["sync", "extra"])).is_err());
        assert!(parse_args(&args(&["read", "JHN", "3", "16"])).is_err());
        assert!(parse_args(&args(&["write"])).is_err());
    }
}
