use std::fs;

use anyhow::{anyhow, bail, Context, Result};
use forge_core::{AppViewModel, ArtifactsView, JobRowView, Msg, SelectedJobView};
use forge_logging::forge_info;

use crate::cli::{Command, SubmitArgs};
use crate::render;
use crate::session::Session;

pub fn run(session: &mut Session, command: Command) -> Result<()> {
    match command {
        Command::Submit(args) => submit(session, args),
        Command::Watch { job, ticks } => watch(session, job, ticks),
        Command::Files { job, read } => files(session, job, read),
        Command::Chat { project, message } => chat(session, project, message),
        Command::Messages { project } => messages(session, project),
        Command::Provider { name } => provider(session, name),
        Command::Projects => projects(session),
        Command::Health => {
            session.check_health()?;
            println!("ok");
            Ok(())
        }
    }
}

fn surfaced_error(view: &AppViewModel) -> Result<()> {
    match &view.last_error {
        Some(message) => Err(anyhow!("{message}")),
        None => Ok(()),
    }
}

fn submit(session: &mut Session, args: SubmitArgs) -> Result<()> {
    let spec = match (args.spec, &args.spec_file) {
        (Some(spec), _) => spec,
        (None, Some(path)) => fs::read_to_string(path)
            .with_context(|| format!("cannot read specification {}", path.display()))?,
        (None, None) => bail!("either --spec or --spec-file is required"),
    };

    session.dispatch(Msg::ProjectNameChanged(args.name));
    session.dispatch(Msg::SpecChanged(spec));
    session.dispatch(Msg::BuildOptionsChanged {
        stack: args.stack,
        max_iters: args.max_iters,
    });
    session.dispatch(Msg::BuildSubmitted);
    let view = session.settle()?;
    surfaced_error(&view)?;

    let job = view
        .selected
        .ok_or_else(|| anyhow!("the service accepted the job but returned no id"))?;
    println!("Submitted job {} ({}), status {}", job.job_id, job.project_name, job.status);

    if args.wait {
        let job = wait_for_finish(session)?;
        print!("{}", render::selected_job(&job));
    }
    Ok(())
}

fn wait_for_finish(session: &mut Session) -> Result<SelectedJobView> {
    session.dispatch(Msg::PollingStarted);
    let mut last_status = session.view().selected.map(|job| job.status);
    session.run_until(
        |_, view| {
            view.selected
                .as_ref()
                .is_some_and(|job| job.status.is_terminal())
        },
        |view| {
            let status = view.selected.as_ref().map(|job| job.status);
            if status != last_status {
                if let Some(status) = status {
                    println!("status: {status}");
                }
                last_status = status;
            }
        },
    );
    session.dispatch(Msg::PollingStopped);
    session
        .view()
        .selected
        .ok_or_else(|| anyhow!("selection lost while waiting"))
}

fn watch(session: &mut Session, job: Option<String>, ticks: Option<u64>) -> Result<()> {
    session.dispatch(Msg::PollingStarted);
    if let Some(job_id) = job {
        session.dispatch(Msg::JobFocusRequested(job_id));
    }

    let mut shown_jobs: Option<Vec<JobRowView>> = None;
    let mut shown_selected: Option<SelectedJobView> = None;
    session.run_until(
        |state, _| {
            ticks.is_some_and(|limit| {
                state.poll_ticks_run() >= limit && state.outstanding_requests() == 0
            })
        },
        |view| {
            if shown_jobs.as_ref() != Some(&view.jobs) {
                print!("{}", render::job_table(view));
                shown_jobs = Some(view.jobs.clone());
            }
            if let Some(selected) = &view.selected {
                if shown_selected.as_ref() != Some(selected) {
                    print!("{}", render::selected_job(selected));
                    shown_selected = Some(selected.clone());
                }
            }
            if let Some(error) = &view.last_error {
                eprintln!("error: {error}");
            }
        },
    );
    session.dispatch(Msg::PollingStopped);
    forge_info!("watch finished after {} ticks", session.state().poll_ticks_run());
    Ok(())
}

fn files(session: &mut Session, job_id: String, read: Option<String>) -> Result<()> {
    session.dispatch(Msg::JobFocusRequested(job_id.clone()));
    let view = session.settle()?;
    surfaced_error(&view)?;
    print!("{}", render::artifacts(&view.artifacts));

    let Some(path) = read else {
        return Ok(());
    };
    if !matches!(view.artifacts, ArtifactsView::Files { .. }) {
        bail!("job {job_id} has no files to read");
    }
    session.dispatch(Msg::FileClicked { path: path.clone() });
    let view = session.settle()?;
    match view.artifacts {
        ArtifactsView::Files {
            open: Some(open), ..
        } => {
            println!("--- {} ({})", open.path, forge_core::format_bytes(open.size));
            println!("{}", open.content.unwrap_or_default());
            Ok(())
        }
        _ => bail!("{path} is not in the workspace of job {job_id}"),
    }
}

fn chat(session: &mut Session, project_id: String, message: String) -> Result<()> {
    session.dispatch(Msg::ChatProjectSelected(Some(project_id.clone())));
    let view = session.settle()?;
    if !view.chat.history_loaded {
        bail!("could not load the message history of project {project_id}");
    }
    session.dispatch(Msg::ChatInputChanged(message));
    session.dispatch(Msg::ChatSubmitted);
    let view = session.settle()?;
    surfaced_error(&view)?;

    if let Some(job) = &view.selected {
        println!("Started job {} ({})", job.job_id, job.status);
    }
    print!("{}", render::messages(&view.chat));
    Ok(())
}

fn messages(session: &mut Session, project_id: String) -> Result<()> {
    session.dispatch(Msg::ChatProjectSelected(Some(project_id)));
    let view = session.settle()?;
    print!("{}", render::messages(&view.chat));
    Ok(())
}

fn provider(session: &mut Session, name: String) -> Result<()> {
    session.dispatch(Msg::ProviderRequested(name));
    let view = session.settle()?;
    surfaced_error(&view)?;
    match view.provider {
        Some(provider) => println!("Provider set to {provider}"),
        None => bail!("no provider name given"),
    }
    Ok(())
}

fn projects(session: &mut Session) -> Result<()> {
    session.dispatch(Msg::ProjectsRequested);
    let view = session.settle()?;
    print!("{}", render::projects(&view.projects));
    Ok(())
}
