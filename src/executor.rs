use crate::constants::{LOG_LEVEL_ERROR, LOG_LEVEL_INFO, LOG_LEVEL_SUCCESS, LOG_TIMESTAMP_FORMAT};
use crate::planner::MovePlan;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Sender;
use tracing::{error, info, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Progress {
    pub value: u64,
    pub max: u64,
}

impl Progress {
    pub fn is_done(self) -> bool {
        self.value == self.max
    }

    pub fn ratio(self) -> f64 {
        if self.max == 0 {
            return 1.0;
        }
        #[allow(clippy::cast_precision_loss)]
        {
            self.value as f64 / self.max as f64
        }
    }
}

/// What an executor reports back while it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorEvent {
    /// `timestamp,LEVEL,message`
    Log(String),
    Progress(Progress),
    /// The run cannot go on.
    Failed(String),
}

/// Performs a move plan inside `dir`, streaming events as it goes.
pub trait Executor: Send + Sync {
    fn execute(
        &self,
        dir: &Path,
        plan: &MovePlan,
        events: &Sender<ExecutorEvent>,
        cancel: &AtomicBool,
    ) -> Result<()>;
}

pub fn log_line(level: &str, message: &str) -> String {
    let timestamp = chrono::Local::now().format(LOG_TIMESTAMP_FORMAT);
    format!("{timestamp},{level},{message}")
}

/// Moves files with plain renames. Never overwrites: an existing
/// destination is logged and skipped.
pub struct DiskExecutor;

impl DiskExecutor {
    fn log(events: &Sender<ExecutorEvent>, level: &str, message: &str) {
        let _ = events.send(ExecutorEvent::Log(log_line(level, message)));
    }
}

impl Executor for DiskExecutor {
    fn execute(
        &self,
        dir: &Path,
        plan: &MovePlan,
        events: &Sender<ExecutorEvent>,
        cancel: &AtomicBool,
    ) -> Result<()> {
        let max = plan.file_count() as u64;
        let mut value = 0;
        info!("Executing plan: {} moves in {}", max, dir.display());

        for entry in &plan.entries {
            let target_dir = dir.join(&entry.group);
            fs::create_dir_all(&target_dir)
                .with_context(|| format!("Failed to create {}", target_dir.display()))?;
            Self::log(
                events,
                LOG_LEVEL_INFO,
                &format!("Directory {} ready", entry.group),
            );

            for name in &entry.files {
                if cancel.load(Ordering::Relaxed) {
                    warn!("Execution cancelled after {value}/{max} moves");
                    Self::log(events, LOG_LEVEL_INFO, "Sort cancelled");
                    return Ok(());
                }

                let source = dir.join(name);
                let target = target_dir.join(name);

                if !source.exists() {
                    Self::log(events, LOG_LEVEL_ERROR, &format!("{name} not found, skipped"));
                } else if target.exists() {
                    Self::log(
                        events,
                        LOG_LEVEL_ERROR,
                        &format!("{}/{name} already exists, skipped", entry.group),
                    );
                } else {
                    match fs::rename(&source, &target) {
                        Ok(()) => Self::log(
                            events,
                            LOG_LEVEL_SUCCESS,
                            &format!("Moved {name} to {}", entry.group),
                        ),
                        Err(e) => {
                            error!("Failed to move {}: {e}", source.display());
                            Self::log(
                                events,
                                LOG_LEVEL_ERROR,
                                &format!("Failed to move {name}: {e}"),
                            );
                        }
                    }
                }

                value += 1;
                let _ = events.send(ExecutorEvent::Progress(Progress { value, max }));
            }
        }

        info!("Plan executed");
        Ok(())
    }
}
