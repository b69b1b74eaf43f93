pub mod app;
pub mod components;

use crate::sort_session::SortStage;
use crate::ui::app::{App, InputMode, Pane};
use crate::ui::components::{
    render_extensions, render_files, render_footer, render_groups, render_header, render_input,
    render_progress, render_review,
};
use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use ratatui::prelude::*;
use std::time::Duration;

pub fn ui(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(0),
            Constraint::Length(4),
        ])
        .split(f.area());

    render_header(f, app, chunks[0]);

    let main_chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(40),
            Constraint::Percentage(20),
            Constraint::Percentage(40),
        ])
        .split(chunks[1]);

    render_files(f, app, main_chunks[0]);
    render_extensions(f, app, main_chunks[1]);
    render_groups(f, app, main_chunks[2]);

    render_footer(f, app, chunks[2]);

    match app.sort.stage {
        SortStage::Reviewing => render_review(f, app),
        SortStage::Executing | SortStage::Complete | SortStage::Failed(_) => {
            render_progress(f, app);
        }
        SortStage::Idle => {}
    }
    render_input(f, app);
}

pub fn run_app(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stderr>>,
    app: &mut App,
) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        app.sort.check_status();

        // Poll with a timeout so progress keeps drawing while sorting
        if event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
        {
            if app.input_mode != InputMode::Normal {
                match key.code {
                    KeyCode::Enter => app.submit_input(),
                    KeyCode::Esc => app.cancel_input(),
                    KeyCode::Backspace => app.pop_char(),
                    KeyCode::Char(c) => app.push_char(c),
                    _ => {}
                }
                continue;
            }

            match app.sort.stage {
                SortStage::Idle => {
                    app.status = None;
                    match key.code {
                        KeyCode::Char('q') => return Ok(()),
                        KeyCode::Tab => app.cycle_pane(),
                        KeyCode::Down | KeyCode::Char('j') => app.next(),
                        KeyCode::Up | KeyCode::Char('k') => app.previous(),
                        KeyCode::Char(c @ '1'..='9') => {
                            app.assign_selected(c as usize - '0' as usize);
                        }
                        KeyCode::Char('x') if app.pane == Pane::Groups => app.evict_selected(),
                        KeyCode::Char('d') if app.pane == Pane::Groups => {
                            app.delete_selected_group();
                        }
                        KeyCode::Char('r') if app.pane == Pane::Groups => app.start_rename(),
                        KeyCode::Char('/') if app.pane != Pane::Groups => {
                            app.start_input(InputMode::Search);
                        }
                        KeyCode::Char('n') => app.start_input(InputMode::NewGroup),
                        KeyCode::Char('o') => app.start_input(InputMode::OpenDirectory),
                        KeyCode::Char('R') => app.reset_groups(),
                        KeyCode::Char('s') => app.review(),
                        _ => {}
                    }
                }
                SortStage::Reviewing => match key.code {
                    KeyCode::Char('y') | KeyCode::Enter => app.confirm(),
                    KeyCode::Char('n' | 'q') | KeyCode::Esc => app.sort.dismiss(),
                    _ => {}
                },
                // Moves can't be taken back halfway; wait for the run to end
                SortStage::Executing => {}
                SortStage::Complete | SortStage::Failed(_) => match key.code {
                    KeyCode::Esc | KeyCode::Enter | KeyCode::Char(' ' | 'q') => app.finish(),
                    _ => {}
                },
            }
        }
    }
}
