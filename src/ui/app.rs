use crate::config::Settings;
use crate::executor::{DiskExecutor, Executor};
use crate::ingest::{DirLister, Lister};
use crate::sort_session::{SortSession, SortStage};
use crate::workspace::Workspace;
use ratatui::widgets::ListState;
use std::path::PathBuf;
use std::sync::Arc;
use sysinfo::Disks;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pane {
    Files,
    Extensions,
    Groups,
}

impl Pane {
    fn next(self) -> Self {
        match self {
            Self::Files => Self::Extensions,
            Self::Extensions => Self::Groups,
            Self::Groups => Self::Files,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Search,
    NewGroup,
    RenameGroup(u64),
    OpenDirectory,
}

/// One line of the groups pane.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupRow {
    Group(u64),
    Extension { group: u64, id: u64 },
    File { group: u64, id: u64 },
}

impl GroupRow {
    pub fn group(self) -> u64 {
        match self {
            Self::Group(group) | Self::Extension { group, .. } | Self::File { group, .. } => group,
        }
    }
}

pub struct App {
    pub workspace: Workspace,
    pub sort: SortSession,
    pub settings: Settings,
    pub disks: Disks,
    pub pane: Pane,
    pub file_state: ListState,
    pub extension_state: ListState,
    pub group_state: ListState,
    pub input_mode: InputMode,
    pub input: String,
    pub status: Option<String>,
    lister: Box<dyn Lister>,
    executor: Arc<dyn Executor>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let lister = Box::new(DirLister::new(settings.clone()));
        Self::with_backends(settings, lister, Arc::new(DiskExecutor))
    }

    pub fn with_backends(
        settings: Settings,
        lister: Box<dyn Lister>,
        executor: Arc<dyn Executor>,
    ) -> Self {
        Self {
            workspace: Workspace::default(),
            sort: SortSession::new(settings.execution_timeout()),
            settings,
            disks: Disks::new_with_refreshed_list(),
            pane: Pane::Files,
            file_state: ListState::default(),
            extension_state: ListState::default(),
            group_state: ListState::default(),
            input_mode: InputMode::Normal,
            input: String::new(),
            status: None,
            lister,
            executor,
        }
    }

    /// Lists `dir` and starts over with it. A failed listing keeps the
    /// current directory and reports the error in the status line.
    pub fn open(&mut self, dir: PathBuf) {
        match self.workspace.load(&dir, self.lister.as_ref()) {
            Ok(()) => {
                self.status = None;
                self.file_state = ListState::default();
                self.extension_state = ListState::default();
                self.group_state = ListState::default();
                self.clamp_selections();
            }
            Err(e) => {
                warn!("Cannot open {}: {e:#}", dir.display());
                self.status = Some(format!("Cannot open {}: {e:#}", dir.display()));
            }
        }
    }

    pub fn cycle_pane(&mut self) {
        self.pane = self.pane.next();
    }

    /// Rows of the groups pane: each group followed by what it owns.
    pub fn group_rows(&self) -> Vec<GroupRow> {
        let mut rows = Vec::new();
        for group in &self.workspace.groups {
            rows.push(GroupRow::Group(group.id));
            rows.extend(group.extension_list().iter().map(|e| GroupRow::Extension {
                group: group.id,
                id: e.id,
            }));
            rows.extend(group.file_list().iter().map(|f| GroupRow::File {
                group: group.id,
                id: f.id,
            }));
        }
        rows
    }

    fn pane_len(&self, pane: Pane) -> usize {
        match pane {
            Pane::Files => self.workspace.visible_files().len(),
            Pane::Extensions => self.workspace.visible_extensions().len(),
            Pane::Groups => self.group_rows().len(),
        }
    }

    fn state_mut(&mut self, pane: Pane) -> &mut ListState {
        match pane {
            Pane::Files => &mut self.file_state,
            Pane::Extensions => &mut self.extension_state,
            Pane::Groups => &mut self.group_state,
        }
    }

    pub fn next(&mut self) {
        let len = self.pane_len(self.pane);
        if len == 0 {
            return;
        }
        let state = self.state_mut(self.pane);
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    pub fn previous(&mut self) {
        let len = self.pane_len(self.pane);
        if len == 0 {
            return;
        }
        let state = self.state_mut(self.pane);
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    /// Keeps every selection inside its list after the lists change.
    fn clamp_selections(&mut self) {
        for pane in [Pane::Files, Pane::Extensions, Pane::Groups] {
            let len = self.pane_len(pane);
            let state = self.state_mut(pane);
            let selected = match (len, state.selected()) {
                (0, _) => None,
                (_, Some(i)) => Some(i.min(len - 1)),
                (_, None) => Some(0),
            };
            state.select(selected);
        }
    }

    fn selected_group(&self) -> Option<u64> {
        let rows = self.group_rows();
        self.group_state
            .selected()
            .and_then(|i| rows.get(i))
            .map(|row| row.group())
    }

    /// Moves the selected file or extension into the `number`th group (1-based).
    pub fn assign_selected(&mut self, number: usize) {
        let Some(group_id) = number
            .checked_sub(1)
            .and_then(|i| self.workspace.groups.iter().nth(i))
            .map(|g| g.id)
        else {
            self.status = Some(format!("No group {number}"));
            return;
        };

        let assigned = match self.pane {
            Pane::Files => {
                let id = self
                    .file_state
                    .selected()
                    .and_then(|i| self.workspace.visible_files().get(i).map(|f| f.id));
                id.is_some_and(|id| self.workspace.assign_file(group_id, id))
            }
            Pane::Extensions => {
                let id = self
                    .extension_state
                    .selected()
                    .and_then(|i| self.workspace.visible_extensions().get(i).map(|e| e.id));
                id.is_some_and(|id| self.workspace.assign_extension(group_id, id))
            }
            Pane::Groups => false,
        };

        if assigned {
            self.status = None;
            self.clamp_selections();
        }
    }

    /// Returns the selected group item to the unsorted panes.
    pub fn evict_selected(&mut self) {
        let rows = self.group_rows();
        let evicted = match self.group_state.selected().and_then(|i| rows.get(i)) {
            Some(GroupRow::File { group, id }) => self.workspace.evict_file(*group, *id),
            Some(GroupRow::Extension { group, id }) => self.workspace.evict_extension(*group, *id),
            _ => false,
        };
        if evicted {
            self.workspace.refresh();
            self.clamp_selections();
        }
    }

    pub fn delete_selected_group(&mut self) {
        if let Some(id) = self.selected_group() {
            self.workspace.delete_group(id);
            self.clamp_selections();
        }
    }

    pub fn reset_groups(&mut self) {
        self.workspace.reset_groups();
        self.clamp_selections();
        self.status = Some("Groups reset".to_string());
    }

    pub fn start_input(&mut self, mode: InputMode) {
        self.input = match mode {
            InputMode::Search => self.query_mut().cloned().unwrap_or_default(),
            InputMode::RenameGroup(id) => self
                .workspace
                .groups
                .by_id(id)
                .map(|g| g.name.clone())
                .unwrap_or_default(),
            InputMode::OpenDirectory => self
                .workspace
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
            InputMode::NewGroup | InputMode::Normal => String::new(),
        };
        self.input_mode = mode;
    }

    pub fn start_rename(&mut self) {
        if let Some(id) = self.selected_group() {
            self.start_input(InputMode::RenameGroup(id));
        }
    }

    fn query_mut(&mut self) -> Option<&mut String> {
        match self.pane {
            Pane::Files => Some(&mut self.workspace.file_query),
            Pane::Extensions => Some(&mut self.workspace.extension_query),
            Pane::Groups => None,
        }
    }

    pub fn push_char(&mut self, c: char) {
        self.input.push(c);
        self.sync_search();
    }

    pub fn pop_char(&mut self) {
        self.input.pop();
        self.sync_search();
    }

    /// Search narrows the pane as the query is typed.
    fn sync_search(&mut self) {
        if self.input_mode == InputMode::Search {
            let input = self.input.clone();
            if let Some(query) = self.query_mut() {
                *query = input;
            }
            self.clamp_selections();
        }
    }

    pub fn cancel_input(&mut self) {
        if self.input_mode == InputMode::Search {
            self.input.clear();
            self.sync_search();
        }
        self.input_mode = InputMode::Normal;
        self.input.clear();
    }

    pub fn submit_input(&mut self) {
        let input = std::mem::take(&mut self.input);
        let mode = std::mem::replace(&mut self.input_mode, InputMode::Normal);

        match mode {
            InputMode::NewGroup => match self.workspace.create_group(&input) {
                Ok(_) => {
                    self.status = None;
                    self.clamp_selections();
                }
                Err(e) => self.status = Some(format!("Cannot create group: {e}")),
            },
            InputMode::RenameGroup(id) => {
                if let Err(e) = self.workspace.rename_group(id, &input) {
                    self.status = Some(format!("Cannot rename group: {e}"));
                }
            }
            InputMode::OpenDirectory => {
                let trimmed = input.trim();
                // Nothing entered: nothing selected.
                if !trimmed.is_empty() {
                    self.open(PathBuf::from(trimmed));
                }
            }
            InputMode::Search | InputMode::Normal => {}
        }
    }

    /// Compiles the plan and puts it up for review.
    pub fn review(&mut self) {
        if self.workspace.groups.is_empty() {
            self.status = Some("Assign files or extensions to a group first".to_string());
            return;
        }
        match self.workspace.compile_plan(self.settings.overlap_policy) {
            Ok(plan) => {
                if let Err(e) = self.sort.review(plan) {
                    self.status = Some(e.to_string());
                }
            }
            Err(e) => self.status = Some(format!("Cannot sort: {e}")),
        }
    }

    pub fn confirm(&mut self) {
        let Some(dir) = self.workspace.directory.clone() else {
            self.status = Some("No directory open".to_string());
            self.sort.dismiss();
            return;
        };
        if let Err(e) = self.sort.submit(Arc::clone(&self.executor), dir) {
            self.status = Some(e.to_string());
        }
    }

    /// Closes a finished run and lists the directory again. Waits for the
    /// worker to hang up so a late failure still shows.
    pub fn finish(&mut self) {
        if !matches!(self.sort.stage, SortStage::Complete | SortStage::Failed(_))
            || !self.sort.worker_done()
        {
            return;
        }
        self.sort.dismiss();
        self.disks.refresh(true);
        if let Some(dir) = self.workspace.directory.clone() {
            info!("Rescanning {}", dir.display());
            self.open(dir);
        }
    }
}
