use crate::config::Settings;
use crate::executor::DiskExecutor;
use crate::ingest::DirLister;
use crate::planner::MovePlan;
use crate::sort_session::{LogLevel, LogLine, SortSession, SortStage};
use crate::workspace::Workspace;
use anyhow::{Context, Result, bail};
use humansize::{BINARY, format_size};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Default, Deserialize)]
pub struct Rules {
    #[serde(default, rename = "group")]
    pub groups: Vec<GroupRule>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GroupRule {
    pub name: String,
    #[serde(default)]
    pub extensions: Vec<String>,
    #[serde(default)]
    pub files: Vec<String>,
}

impl Rules {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read rules {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("Invalid rules file {}", path.display()))
    }

    /// Creates the groups and assigns extensions and files by name. Names
    /// the listing doesn't contain, or that an earlier group already took,
    /// are skipped with a warning.
    pub fn apply_to(&self, workspace: &mut Workspace) -> Result<()> {
        for rule in &self.groups {
            let group_id = workspace
                .create_group(&rule.name)
                .with_context(|| format!("Cannot create group '{}'", rule.name))?;

            for ext in &rule.extensions {
                let key = ext.trim_start_matches('.').to_lowercase();
                let id = workspace.initial_extensions().by_name(&key).map(|e| e.id);
                if !id.is_some_and(|id| workspace.assign_extension(group_id, id)) {
                    warn!("Extension '{key}' not available for '{}'", rule.name);
                }
            }

            for name in &rule.files {
                let id = workspace.initial_files().by_name(name).map(|f| f.id);
                if !id.is_some_and(|id| workspace.assign_file(group_id, id)) {
                    warn!("File '{name}' not available for '{}'", rule.name);
                }
            }
        }
        Ok(())
    }
}

pub struct ApplyOptions<'a> {
    pub dir: &'a Path,
    pub rules: &'a Path,
    pub dry_run: bool,
    pub json: bool,
}

pub fn run_apply(settings: &Settings, options: &ApplyOptions) -> Result<()> {
    let rules = Rules::load(options.rules)?;
    let mut workspace = Workspace::default();
    workspace.load(options.dir, &DirLister::new(settings.clone()))?;
    rules.apply_to(&mut workspace)?;

    let plan = workspace.compile_plan(settings.overlap_policy)?;
    if options.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&workspace, &plan);
    }

    if options.dry_run {
        info!("Dry run, nothing moved");
        return Ok(());
    }
    execute(settings, options.dir, plan)
}

fn print_plan(workspace: &Workspace, plan: &MovePlan) {
    let summary = workspace.summary();
    println!(
        "{} files ({}), {} extensions, {} groups",
        summary.files,
        format_size(summary.total_size, BINARY),
        summary.extensions,
        summary.groups
    );
    println!(
        "Create {} directories, move {} files",
        plan.directory_count(),
        plan.file_count()
    );
    for entry in &plan.entries {
        println!("  {}/ ({})", entry.group, entry.files.len());
        for file in &entry.files {
            println!("    {file}");
        }
    }
    for overlap in workspace.overlaps() {
        println!(
            "  ! {} is claimed by {}",
            overlap.file,
            overlap.groups.join(", ")
        );
    }
}

fn execute(settings: &Settings, dir: &Path, plan: MovePlan) -> Result<()> {
    let mut session = SortSession::new(settings.execution_timeout());
    session.review(plan)?;
    session.submit(Arc::new(DiskExecutor), dir.to_path_buf())?;

    let pb = ProgressBar::new(session.progress.max);
    pb.set_style(
        ProgressStyle::with_template(
            "  {spinner:.cyan} Sorting [{bar:30.cyan/dim}] {pos}/{len} files",
        )?
        .progress_chars("━╸─")
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏"),
    );
    pb.enable_steady_tick(Duration::from_millis(80));

    // Wait for the worker itself, not just the stage: an empty plan is
    // complete before its directories exist.
    let mut printed = 0;
    loop {
        session.check_status();
        for line in &session.log[printed..] {
            pb.println(format_log_line(line));
        }
        printed = session.log.len();
        pb.set_position(session.progress.value);

        if session.worker_done() {
            break;
        }
        thread::sleep(Duration::from_millis(50));
    }
    pb.finish_and_clear();

    match session.stage {
        SortStage::Complete => {
            let errors = session
                .log
                .iter()
                .filter(|l| l.level == LogLevel::Error)
                .count();
            eprintln!(
                "  \x1b[32m✓\x1b[0m Sort complete: {} files processed, {errors} errors",
                session.progress.value
            );
            Ok(())
        }
        SortStage::Failed(reason) => bail!("Sort failed: {reason}"),
        _ => Ok(()),
    }
}

fn format_log_line(line: &LogLine) -> String {
    let marker = match line.level {
        LogLevel::Info => "[i]",
        LogLevel::Success => "[✓]",
        LogLevel::Error => "[✗]",
    };
    format!("{} {marker} {}", line.timestamp, line.message)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::ListingEntry;
    use tempfile::tempdir;

    const RULES: &str = r#"
        [[group]]
        name = "Docs"
        extensions = [".PDF", "txt"]

        [[group]]
        name = "Pics"
        files = ["photo.jpg", "missing.png"]
    "#;

    #[test]
    fn rules_assign_by_name() -> Result<()> {
        let rules: Rules = toml::from_str(RULES)?;
        let mut ws = Workspace::from_listing(
            None,
            &[
                ListingEntry::new("report.pdf", 1),
                ListingEntry::new("notes.txt", 1),
                ListingEntry::new("photo.jpg", 1),
            ],
        );
        rules.apply_to(&mut ws)?;

        let plan = ws.compile_plan(crate::planner::OverlapPolicy::Preserve)?;
        assert_eq!(
            plan.get("Docs"),
            Some(&["report.pdf".to_string(), "notes.txt".to_string()][..])
        );
        assert_eq!(plan.get("Pics"), Some(&["photo.jpg".to_string()][..]));
        assert!(ws.visible_files().iter().all(|f| f.name != "photo.jpg"));
        Ok(())
    }

    #[test]
    fn invalid_group_name_is_an_error() -> Result<()> {
        let rules: Rules = toml::from_str("[[group]]\nname = \"a/b\"")?;
        let mut ws = Workspace::default();
        assert!(rules.apply_to(&mut ws).is_err());
        Ok(())
    }

    #[test]
    fn apply_moves_files_end_to_end() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("inbox");
        fs::create_dir(&root)?;
        fs::write(root.join("report.pdf"), b"pdf")?;
        fs::write(root.join("notes.txt"), b"txt")?;
        let rules_path = dir.path().join("rules.toml");
        fs::write(&rules_path, "[[group]]\nname = \"Docs\"\nextensions = [\"pdf\"]")?;

        let options = ApplyOptions {
            dir: &root,
            rules: &rules_path,
            dry_run: false,
            json: true,
        };
        run_apply(&Settings::default(), &options)?;

        assert!(root.join("Docs/report.pdf").exists());
        assert!(root.join("notes.txt").exists());
        Ok(())
    }

    #[test]
    fn dry_run_moves_nothing() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("report.pdf"), b"pdf")?;
        let rules_path = dir.path().join("rules.toml");
        fs::write(&rules_path, "[[group]]\nname = \"Docs\"\nextensions = [\"pdf\"]")?;

        let options = ApplyOptions {
            dir: dir.path(),
            rules: &rules_path,
            dry_run: true,
            json: false,
        };
        run_apply(&Settings::default(), &options)?;

        assert!(dir.path().join("report.pdf").exists());
        assert!(!dir.path().join("Docs").exists());
        Ok(())
    }

    #[test]
    fn empty_group_still_gets_a_directory() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("notes.txt"), b"txt")?;
        let rules_path = dir.path().join("rules.toml");
        fs::write(&rules_path, "[[group]]\nname = \"Later\"")?;

        let options = ApplyOptions {
            dir: dir.path(),
            rules: &rules_path,
            dry_run: false,
            json: false,
        };
        run_apply(&Settings::default(), &options)?;

        assert!(dir.path().join("Later").is_dir());
        Ok(())
    }

    #[test]
    fn failure_after_last_move_is_an_error() -> Result<()> {
        let dir = tempdir()?;
        let root = dir.path().join("inbox");
        fs::create_dir(&root)?;
        fs::write(root.join("a.pdf"), b"pdf")?;
        // A regular file where the empty group's directory should go.
        fs::write(root.join("Later"), b"")?;
        let rules_path = dir.path().join("rules.toml");
        fs::write(
            &rules_path,
            "[[group]]\nname = \"Docs\"\nextensions = [\"pdf\"]\n\n[[group]]\nname = \"Later\"",
        )?;

        let options = ApplyOptions {
            dir: &root,
            rules: &rules_path,
            dry_run: false,
            json: false,
        };
        let result = run_apply(&Settings::default(), &options);

        assert!(result.is_err());
        assert!(root.join("Docs/a.pdf").exists());
        assert!(root.join("Later").is_file());
        Ok(())
    }

    #[test]
    fn log_lines_render_with_markers() {
        let line = LogLine::parse("t,SUCCESS,Moved a");
        assert_eq!(format_log_line(&line), "t [✓] Moved a");
        assert_eq!(format_log_line(&LogLine::parse("t,ERROR,x")), "t [✗] x");
    }
}
