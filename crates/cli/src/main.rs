use anyhow::{Context, Result};
use audioshelf_config::{Config, ConfigManager};
use audioshelf_library::{ConfigPreferences, LibraryManager};
use clap::{Arg, ArgAction, Command};
use console::style;
use std::path::PathBuf;
use std::sync::Arc;

mod commands;
mod player;

fn build_cli() -> Command {
    Command::new("audioshelf")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Audiobook library manager")
        .arg(
            Arg::new("database")
                .short('d')
                .long("database")
                .value_name("PATH")
                .help("Path to the database file (overrides the config)")
                .global(true),
        )
        .arg(
            Arg::new("config-dir")
                .short('c')
                .long("config-dir")
                .value_name("DIR")
                .help("Directory holding config.toml")
                .global(true),
        )
        .subcommand(Command::new("init").about("Create the config file and database"))
        .subcommand(Command::new("list").about("List active books"))
        .subcommand(Command::new("orphaned").about("List hidden books"))
        .subcommand(
            Command::new("add")
                .about("Add a book made of the given chapter files")
                .arg(Arg::new("root").required(true).value_name("ROOT").help("Root folder or file of the book"))
                .arg(Arg::new("name").short('n').long("name").value_name("NAME").help("Book name (defaults to the root's file name)"))
                .arg(Arg::new("author").short('a').long("author").value_name("AUTHOR").help("Book author"))
                .arg(
                    Arg::new("type")
                        .short('t')
                        .long("type")
                        .value_name("TYPE")
                        .help("Book type")
                        .value_parser(["COLLECTION_FOLDER", "COLLECTION_FILE", "SINGLE_FOLDER", "SINGLE_FILE"])
                        .default_value("SINGLE_FOLDER"),
                )
                .arg(
                    Arg::new("chapters")
                        .required(true)
                        .value_name("FILE")
                        .help("Chapter files in playing order")
                        .action(ArgAction::Append),
                ),
        )
        .subcommand(
            Command::new("hide")
                .about("Hide books from the library")
                .arg(Arg::new("ids").required(true).value_name("BOOK_ID").action(ArgAction::Append)),
        )
        .subcommand(
            Command::new("reveal")
                .about("Restore a hidden book")
                .arg(Arg::new("id").required(true).value_name("BOOK_ID")),
        )
        .subcommand(
            Command::new("chapter")
                .about("Show the chapter stored for a file")
                .arg(Arg::new("file").required(true).value_name("FILE")),
        )
        .subcommand(
            Command::new("search")
                .about("Find a book like a voice search would and play it")
                .arg(Arg::new("query").short('q').long("query").value_name("QUERY"))
                .arg(
                    Arg::new("focus")
                        .short('f')
                        .long("focus")
                        .value_name("FOCUS")
                        .help("artist, album, playlist, any or a raw media focus string"),
                )
                .arg(Arg::new("artist").long("artist").value_name("ARTIST"))
                .arg(Arg::new("album").long("album").value_name("ALBUM"))
                .arg(Arg::new("playlist").long("playlist").value_name("PLAYLIST")),
        )
        .subcommand(Command::new("current").about("Show the current book"))
        .subcommand(Command::new("stats").about("Show library statistics"))
}

fn init_logging(config: &Config) {
    let default_filter = config.app.log_level.to_string();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let matches = build_cli().get_matches();

    let config_manager = match matches.get_one::<String>("config-dir") {
        Some(dir) => ConfigManager::with_directory(PathBuf::from(dir)),
        None => ConfigManager::new(),
    }
    .context("Failed to locate the config directory")?;
    let config_manager = Arc::new(config_manager);

    let config = config_manager
        .load_with_env_overrides()
        .context("Failed to load configuration")?;
    init_logging(&config);

    if let Some(("init", _)) = matches.subcommand() {
        config_manager
            .initialize()
            .context("Failed to write default configuration")?;
    }

    let db_path = match matches.get_one::<String>("database") {
        Some(database) => PathBuf::from(database),
        None => config_manager.database_path(&config),
    };

    let preferences = Arc::new(ConfigPreferences::new(config_manager.clone()));
    let library = LibraryManager::with_database(&db_path, config, preferences)
        .await
        .context("Failed to open library")?;

    let result = match matches.subcommand() {
        Some(("init", _)) => commands::show_init(&library, &config_manager, &db_path).await,
        Some(("list", _)) => {
            commands::list_books(&library);
            Ok(())
        }
        Some(("orphaned", _)) => {
            commands::list_orphaned(&library);
            Ok(())
        }
        Some(("add", sub_matches)) => commands::add_book(&library, sub_matches).await,
        Some(("hide", sub_matches)) => commands::hide_books(&library, sub_matches).await,
        Some(("reveal", sub_matches)) => commands::reveal_book(&library, sub_matches).await,
        Some(("chapter", sub_matches)) => commands::show_chapter(&library, sub_matches),
        Some(("search", sub_matches)) => commands::search(&library, sub_matches),
        Some(("current", _)) => {
            commands::show_current(&library);
            Ok(())
        }
        Some(("stats", _)) => {
            commands::show_stats(&library);
            Ok(())
        }
        _ => {
            build_cli().print_help()?;
            Ok(())
        }
    };

    library.close().await;
    if let Err(e) = &result {
        if let Some(message) = commands::user_message(e) {
            eprintln!("{} {}", style("✗").red().bold(), message);
        }
    }
    result
}
