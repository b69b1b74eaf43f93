use crate::constants::{LOG_LEVEL_ERROR, LOG_LEVEL_INFO, LOG_LEVEL_SUCCESS};
use crate::error::SessionError;
use crate::executor::{Executor, ExecutorEvent, Progress, log_line};
use crate::planner::MovePlan;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortStage {
    Idle,
    Reviewing,
    Executing,
    Complete,
    Failed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Info,
    Success,
    Error,
}

/// One parsed `timestamp,LEVEL,message` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub raw: String,
    pub timestamp: String,
    pub level: LogLevel,
    pub message: String,
}

impl LogLine {
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(3, ',');
        let timestamp = parts.next().unwrap_or_default().to_string();
        let level = match parts.next() {
            Some(LOG_LEVEL_INFO) => LogLevel::Info,
            Some(LOG_LEVEL_SUCCESS) => LogLevel::Success,
            _ => LogLevel::Error,
        };
        let message = parts.next().unwrap_or_default().to_string();
        Self {
            raw: raw.to_string(),
            timestamp,
            level,
            message,
        }
    }
}

/// Drives one move plan from review through execution.
///
/// `Reviewing -> Executing -> Complete`, or `Failed` when the executor gives
/// up or goes quiet for longer than the timeout. Completion is observed, not
/// signalled: the run is complete once progress reaches its max. A failure
/// reported after that, while the worker is still attached, turns Complete
/// into Failed. Complete and Failed sessions may go back to reviewing a new
/// plan; an executing one may not.
pub struct SortSession {
    pub stage: SortStage,
    pub plan: Option<MovePlan>,
    pub log: Vec<LogLine>,
    pub progress: Progress,
    timeout: Duration,
    events_rx: Option<Receiver<ExecutorEvent>>,
    cancel: Option<Arc<AtomicBool>>,
    last_event: Instant,
}

impl SortSession {
    pub fn new(timeout: Duration) -> Self {
        Self {
            stage: SortStage::Idle,
            plan: None,
            log: Vec::new(),
            progress: Progress::default(),
            timeout,
            events_rx: None,
            cancel: None,
            last_event: Instant::now(),
        }
    }

    pub fn is_executing(&self) -> bool {
        self.stage == SortStage::Executing
    }

    /// True once the worker has hung up its end of the channel.
    pub fn worker_done(&self) -> bool {
        self.events_rx.is_none()
    }

    /// Puts a freshly compiled plan up for confirmation.
    pub fn review(&mut self, plan: MovePlan) -> Result<(), SessionError> {
        if self.is_executing() {
            return Err(SessionError::AlreadyExecuting);
        }
        self.plan = Some(plan);
        self.stage = SortStage::Reviewing;
        Ok(())
    }

    /// Drops the plan under review without running it.
    pub fn dismiss(&mut self) {
        if !self.is_executing() {
            self.stage = SortStage::Idle;
            self.plan = None;
        }
    }

    /// Confirms the plan under review and runs it on a worker thread.
    pub fn submit(
        &mut self,
        executor: Arc<dyn Executor>,
        dir: PathBuf,
    ) -> Result<(), SessionError> {
        if self.stage != SortStage::Reviewing {
            return Err(SessionError::NotReviewing);
        }
        let plan = self.plan.clone().ok_or(SessionError::NoPlan)?;

        self.log.clear();
        self.progress = Progress {
            value: 0,
            max: plan.file_count() as u64,
        };
        self.stage = SortStage::Executing;
        self.last_event = Instant::now();
        info!(
            "Sorting {} files into {} directories",
            self.progress.max,
            plan.directory_count()
        );

        if self.progress.is_done() {
            // Nothing to move, but the executor still creates the directories.
            self.stage = SortStage::Complete;
        }

        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));
        self.events_rx = Some(rx);
        self.cancel = Some(Arc::clone(&cancel));

        thread::spawn(move || {
            if let Err(e) = executor.execute(&dir, &plan, &tx, &cancel) {
                error!("Sort failed: {e:#}");
                let _ = tx.send(ExecutorEvent::Failed(format!("{e:#}")));
            }
        });
        Ok(())
    }

    /// Applies one executor event, in arrival order.
    pub fn apply(&mut self, event: ExecutorEvent) {
        self.last_event = Instant::now();
        match event {
            ExecutorEvent::Log(raw) => self.push_log(&raw),
            ExecutorEvent::Progress(progress) => {
                self.progress = progress;
                if self.is_executing() && progress.is_done() {
                    info!("Sort complete");
                    self.stage = SortStage::Complete;
                }
            }
            ExecutorEvent::Failed(reason) => {
                // Reaching max doesn't make the run a success if the worker
                // gives up afterwards, e.g. on a trailing empty group.
                if matches!(self.stage, SortStage::Executing | SortStage::Complete) {
                    self.stage = SortStage::Failed(reason.clone());
                }
                self.push_log(&log_line(LOG_LEVEL_ERROR, &reason));
            }
        }
    }

    fn push_log(&mut self, raw: &str) {
        if !self.log.iter().any(|l| l.raw == raw) {
            self.log.push(LogLine::parse(raw));
        }
    }

    /// Drains whatever the worker has sent so far, then checks the timeout.
    pub fn check_status(&mut self) {
        let Some(rx) = self.events_rx.take() else {
            return;
        };

        let mut disconnected = false;
        loop {
            match rx.try_recv() {
                Ok(event) => self.apply(event),
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    disconnected = true;
                    break;
                }
            }
        }

        if self.is_executing() && self.last_event.elapsed() > self.timeout {
            warn!("No executor activity for {:?}, giving up", self.timeout);
            if let Some(cancel) = &self.cancel {
                cancel.store(true, Ordering::Relaxed);
            }
            self.stage = SortStage::Failed("executor timed out".to_string());
        }

        if disconnected {
            self.cancel = None;
            if self.is_executing() {
                // The worker is gone without reaching max.
                self.stage = SortStage::Failed("executor stopped early".to_string());
            }
        } else {
            self.events_rx = Some(rx);
        }
    }
}
