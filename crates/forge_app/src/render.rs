//! Plain-text rendering of the view model.

use std::fmt::Write as _;

use chrono::{DateTime, Local, Utc};
use forge_core::{
    format_bytes, AppViewModel, ArtifactsView, ChatView, MessageRole, Project, SelectedJobView,
};

pub fn job_table(view: &AppViewModel) -> String {
    if view.jobs.is_empty() {
        return "No jobs yet.\n".to_string();
    }
    let mut out = String::new();
    for row in &view.jobs {
        let marker = if row.selected { '*' } else { ' ' };
        let _ = writeln!(
            out,
            "{marker} {:<36} {:<10} {}",
            row.job_id,
            row.status.as_str(),
            row.project_name
        );
    }
    out
}

pub fn selected_job(job: &SelectedJobView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Job {} ({})", job.job_id, job.project_name);
    let _ = writeln!(out, "  status: {}", job.status);
    if let Some(mode) = job.mode {
        let _ = writeln!(out, "  mode: {}", mode.as_str());
    }
    if let Some(project_id) = &job.project_id {
        let _ = writeln!(out, "  project: {project_id}");
    }
    if let Some(created) = job.created {
        let _ = writeln!(out, "  created: {}", format_timestamp(created));
    }
    if let Some(stack) = &job.stack {
        let _ = writeln!(out, "  stack: {stack}");
    }
    if job.log_entries > 0 {
        let _ = writeln!(out, "  log entries: {}", job.log_entries);
    }
    let _ = writeln!(out, "  report:");
    for line in job.report.lines() {
        let _ = writeln!(out, "    {line}");
    }
    out
}

pub fn artifacts(view: &ArtifactsView) -> String {
    match view {
        ArtifactsView::NoSelection => "Select a job to see its files.\n".to_string(),
        ArtifactsView::NotSucceeded { status } => {
            format!("Files are available once the job succeeds (currently {status}).\n")
        }
        ArtifactsView::Loading => "Loading files...\n".to_string(),
        ArtifactsView::Empty => "The workspace is empty.\n".to_string(),
        ArtifactsView::Files { files, .. } => {
            let mut out = String::new();
            for file in files {
                let _ = writeln!(out, "{:>10}  {}", format_bytes(file.size), file.path);
            }
            out
        }
    }
}

pub fn messages(chat: &ChatView) -> String {
    if chat.messages.is_empty() {
        return "No messages.\n".to_string();
    }
    let mut out = String::new();
    for message in &chat.messages {
        let who = match message.role {
            MessageRole::User => "you",
            MessageRole::Assistant => "forge",
        };
        let _ = writeln!(
            out,
            "[{}] {who}: {}",
            format_timestamp(message.timestamp),
            message.content
        );
        if let Some(job_id) = &message.job_id {
            let _ = writeln!(out, "    job {job_id}");
        }
    }
    out
}

pub fn projects(projects: &[Project]) -> String {
    if projects.is_empty() {
        return "No projects.\n".to_string();
    }
    let mut out = String::new();
    for project in projects {
        let updated = project
            .updated
            .or(project.created)
            .map(format_timestamp)
            .unwrap_or_default();
        let _ = writeln!(out, "{}  {:<24} {updated}", project.id, project.name);
        if !project.description.is_empty() {
            let _ = writeln!(out, "    {}", project.description);
        }
    }
    out
}

/// Unix seconds as local wall-clock time; the raw number when out of range.
pub fn format_timestamp(seconds: f64) -> String {
    local_time(seconds)
        .map(|time| time.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| seconds.to_string())
}

fn local_time(seconds: f64) -> Option<DateTime<Local>> {
    if !seconds.is_finite() {
        return None;
    }
    let millis = (seconds * 1000.0).round() as i64;
    DateTime::<Utc>::from_timestamp_millis(millis).map(|utc| utc.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use forge_core::{ArtifactEntry, JobStatus, Message};
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn placeholders_explain_missing_files() {
        assert_eq!(
            artifacts(&ArtifactsView::NotSucceeded {
                status: JobStatus::Running
            }),
            "Files are available once the job succeeds (currently running).\n"
        );
        assert_eq!(artifacts(&ArtifactsView::Empty), "The workspace is empty.\n");
    }

    #[test]
    fn files_are_listed_with_sizes() {
        let view = ArtifactsView::Files {
            files: vec![ArtifactEntry {
                path: "app/main.py".to_string(),
                size: 1536,
            }],
            open: None,
        };
        assert_eq!(artifacts(&view), "    1.5 KB  app/main.py\n");
    }

    #[test]
    fn timestamps_fall_back_to_the_raw_value() {
        assert_eq!(format_timestamp(f64::NAN), "NaN");
        assert_eq!(format_timestamp(0.0).len(), "1970-01-01 00:00:00".len());
    }

    #[test]
    fn selected_job_shows_details_when_known() {
        let mut job = SelectedJobView {
            job_id: "j1".to_string(),
            project_name: "todo".to_string(),
            status: JobStatus::Running,
            mode: None,
            project_id: None,
            created: None,
            stack: None,
            log_entries: 0,
            report: "{}".to_string(),
        };
        assert_eq!(
            selected_job(&job),
            "Job j1 (todo)\n  status: running\n  report:\n    {}\n"
        );

        job.created = Some(0.0);
        job.stack = Some("fastapi".to_string());
        job.log_entries = 3;
        let text = selected_job(&job);
        assert!(text.contains(&format!("  created: {}\n", format_timestamp(0.0))));
        assert!(text.contains("  stack: fastapi\n"));
        assert!(text.contains("  log entries: 3\n"));
    }

    #[test]
    fn messages_name_the_speaker() {
        let chat = ChatView {
            messages: vec![Message {
                id: "m1".to_string(),
                role: MessageRole::Assistant,
                content: "done".to_string(),
                timestamp: 1_700_000_000.0,
                job_id: None,
            }],
            ..ChatView::default()
        };
        assert!(messages(&chat).contains("forge: done"));
    }
}
