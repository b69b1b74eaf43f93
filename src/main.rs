mod catalog;
mod config;
mod constants;
mod error;
mod executor;
mod groups;
mod headless;
mod ingest;
mod logging;
mod model;
mod planner;
mod resolver;
mod sort_session;
mod ui;
mod workspace;

use anyhow::Result;
use clap::{Parser, Subcommand};
use config::Settings;
use crossterm::{
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use headless::ApplyOptions;
use ratatui::prelude::*;
use std::io;
use std::path::PathBuf;
use ui::app::App;

#[derive(Parser)]
#[command(version, about, long_about = None, disable_version_flag = true)]
struct Cli {
    /// Directory to open on start
    dir: Option<PathBuf>,

    /// Settings file (default: <config dir>/sortra/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print version information
    #[arg(short = 'v', long = "version", action = clap::ArgAction::Version)]
    version: Option<bool>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Sort a directory by a rules file, without the UI
    Apply {
        /// Directory to sort
        dir: PathBuf,

        /// TOML file of [[group]] rules
        #[arg(short, long)]
        rules: PathBuf,

        /// Print the plan without moving anything
        #[arg(long)]
        dry_run: bool,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load(cli.config.as_deref());
    let _guard = logging::init_logger(&settings)?;

    if let Some(Commands::Apply {
        dir,
        rules,
        dry_run,
        json,
    }) = &cli.command
    {
        let options = ApplyOptions {
            dir,
            rules,
            dry_run: *dry_run,
            json: *json,
        };
        return headless::run_apply(&settings, &options);
    }

    let mut app = App::new(settings);
    if let Some(dir) = cli.dir {
        app.open(dir);
    }

    enable_raw_mode()?;
    let mut stderr = io::stderr();
    execute!(stderr, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stderr);
    let mut terminal = Terminal::new(backend)?;

    let res = ui::run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        println!("{err:?}");
    }

    Ok(())
}
