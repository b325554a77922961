use std::sync::Once;

use forge_core::{
    list_files_gate, update, AppState, ArtifactEntry, ArtifactsView, Effect, Job, JobStatus, Msg,
    OpenFileView, RemoteError, RemoteErrorKind, Ticket,
};
use pretty_assertions::assert_eq;

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(forge_logging::initialize_for_tests);
}

fn job(id: &str, status: JobStatus) -> Job {
    Job {
        id: id.to_string(),
        project_name: format!("proj-{id}"),
        status,
        ..Job::default()
    }
}

fn entry(path: &str, size: u64) -> ArtifactEntry {
    ArtifactEntry {
        path: path.to_string(),
        size,
    }
}

fn three_files() -> Vec<ArtifactEntry> {
    vec![
        entry("README.md", 120),
        entry("app/main.py", 2048),
        entry("tests/test_main.py", 512),
    ]
}

fn list_files_ticket(effects: &[Effect], expected_job: &str) -> Ticket {
    match effects {
        [Effect::ListFiles {
            ticket,
            job_id,
            status,
        }] => {
            assert_eq!(job_id, expected_job);
            assert_eq!(*status, JobStatus::Succeeded);
            *ticket
        }
        other => panic!("expected a single ListFiles, got {other:?}"),
    }
}

fn select(state: AppState, job: Job) -> (AppState, Vec<Effect>) {
    update(state, Msg::JobSelected(job))
}

fn files_listed(state: AppState, ticket: Ticket, files: Vec<ArtifactEntry>) -> AppState {
    update(
        state,
        Msg::FilesListed {
            ticket,
            result: Ok(files),
        },
    )
    .0
}

fn with_files(job_id: &str) -> AppState {
    let (state, effects) = select(AppState::new(), job(job_id, JobStatus::Succeeded));
    let ticket = list_files_ticket(&effects, job_id);
    files_listed(state, ticket, three_files())
}

#[test]
fn gate_only_admits_succeeded_jobs() {
    assert_eq!(list_files_gate(&job("ok", JobStatus::Succeeded)), Ok("ok"));
    for status in [JobStatus::Queued, JobStatus::Running, JobStatus::Failed] {
        let violation = list_files_gate(&job("j", status)).unwrap_err();
        assert_eq!(violation.status, status);
    }
}

#[test]
fn no_selection_shows_placeholder() {
    assert_eq!(AppState::new().view().artifacts, ArtifactsView::NoSelection);
}

#[test]
fn files_are_never_listed_for_unfinished_jobs() {
    init_logging();
    for status in [JobStatus::Queued, JobStatus::Running, JobStatus::Failed] {
        let (state, effects) = select(AppState::new(), job("j", status));
        assert!(
            !effects
                .iter()
                .any(|effect| matches!(effect, Effect::ListFiles { .. })),
            "listed files for {status}"
        );
        assert_eq!(state.view().artifacts, ArtifactsView::NotSucceeded { status });
    }
}

#[test]
fn succeeded_selection_lists_files() {
    init_logging();
    let (state, effects) = select(AppState::new(), job("a", JobStatus::Succeeded));
    let ticket = list_files_ticket(&effects, "a");
    assert_eq!(state.view().artifacts, ArtifactsView::Loading);

    let state = files_listed(state, ticket, three_files());
    assert_eq!(
        state.view().artifacts,
        ArtifactsView::Files {
            files: three_files(),
            open: None
        }
    );
}

#[test]
fn empty_workspace_has_its_own_placeholder() {
    init_logging();
    let (state, effects) = select(AppState::new(), job("a", JobStatus::Succeeded));
    let state = files_listed(state, list_files_ticket(&effects, "a"), Vec::new());
    assert_eq!(state.view().artifacts, ArtifactsView::Empty);
}

#[test]
fn listing_failure_degrades_to_empty() {
    init_logging();
    let (state, effects) = select(AppState::new(), job("a", JobStatus::Succeeded));
    let (state, _) = update(
        state,
        Msg::FilesListed {
            ticket: list_files_ticket(&effects, "a"),
            result: Err(RemoteError::transport("unreachable")),
        },
    );
    assert_eq!(state.view().artifacts, ArtifactsView::Empty);
    assert!(state.view().last_error.is_none());
}

#[test]
fn switching_jobs_before_listing_resolves_never_shows_stale_files() {
    init_logging();
    let (state, effects) = select(AppState::new(), job("A", JobStatus::Succeeded));
    let ticket_a = list_files_ticket(&effects, "A");

    let (state, effects) = select(state, job("B", JobStatus::Running));
    assert!(effects.is_empty());

    let state = files_listed(state, ticket_a, three_files());
    assert_eq!(
        state.view().artifacts,
        ArtifactsView::NotSucceeded {
            status: JobStatus::Running
        }
    );

    // B finishing later must list B's files from scratch.
    let (state, effects) = select(state, job("B", JobStatus::Succeeded));
    list_files_ticket(&effects, "B");
    assert_eq!(state.view().artifacts, ArtifactsView::Loading);
}

#[test]
fn status_change_through_polling_triggers_listing() {
    init_logging();
    let (state, _) = update(AppState::new(), Msg::PollingStarted);
    let (state, _) = select(state, job("a", JobStatus::Running));
    let (state, effects) = update(state, Msg::PollTick);
    let detail = effects
        .iter()
        .find_map(|effect| match effect {
            Effect::FetchJob { ticket, .. } => Some(*ticket),
            _ => None,
        })
        .expect("detail");

    let (state, effects) = update(
        state,
        Msg::JobDetailLoaded {
            ticket: detail,
            result: Ok(job("a", JobStatus::Succeeded)),
        },
    );
    list_files_ticket(&effects, "a");
    assert_eq!(state.view().artifacts, ArtifactsView::Loading);
}

#[test]
fn reselecting_same_job_keeps_listing() {
    init_logging();
    let state = with_files("a");
    let (state, effects) = select(state, job("a", JobStatus::Succeeded));
    assert!(effects.is_empty());
    assert!(matches!(state.view().artifacts, ArtifactsView::Files { .. }));
}

#[test]
fn clicking_a_file_reads_it_lazily() {
    init_logging();
    let state = with_files("a");
    let (state, effects) = update(
        state,
        Msg::FileClicked {
            path: "app/main.py".to_string(),
        },
    );
    let ticket = match effects.as_slice() {
        [Effect::ReadFile {
            ticket,
            job_id,
            path,
        }] => {
            assert_eq!(job_id, "a");
            assert_eq!(path, "app/main.py");
            *ticket
        }
        other => panic!("expected ReadFile, got {other:?}"),
    };
    let loading = OpenFileView {
        path: "app/main.py".to_string(),
        size: 2048,
        content: None,
    };
    assert_eq!(
        state.view().artifacts,
        ArtifactsView::Files {
            files: three_files(),
            open: Some(loading)
        }
    );

    let (state, _) = update(
        state,
        Msg::FileRead {
            ticket,
            result: Ok("print('hi')\n".to_string()),
        },
    );
    let ArtifactsView::Files { open: Some(open), .. } = state.view().artifacts else {
        panic!("expected open file");
    };
    assert_eq!(open.content.as_deref(), Some("print('hi')\n"));
}

#[test]
fn read_failure_is_shown_inline() {
    init_logging();
    let state = with_files("a");
    let (state, effects) = update(
        state,
        Msg::FileClicked {
            path: "README.md".to_string(),
        },
    );
    let ticket = effects[0].ticket().expect("ticket");
    let (state, effects) = update(
        state,
        Msg::FileRead {
            ticket,
            result: Err(RemoteError::new(
                RemoteErrorKind::Server { status: 400 },
                "File is not text-readable",
            )),
        },
    );

    assert!(effects.is_empty());
    let view = state.view();
    assert!(view.last_error.is_none());
    let ArtifactsView::Files { files, open: Some(open) } = view.artifacts else {
        panic!("expected open file");
    };
    assert_eq!(files.len(), 3);
    assert_eq!(
        open.content.as_deref(),
        Some("Error reading file: File is not text-readable")
    );
}

#[test]
fn content_of_previous_job_is_dropped() {
    init_logging();
    let state = with_files("a");
    let (state, effects) = update(
        state,
        Msg::FileClicked {
            path: "README.md".to_string(),
        },
    );
    let read_ticket = effects[0].ticket().expect("ticket");

    let (state, effects) = select(state, job("b", JobStatus::Succeeded));
    let list_b = list_files_ticket(&effects, "b");
    let (state, _) = update(
        state,
        Msg::FileRead {
            ticket: read_ticket,
            result: Ok("# a readme".to_string()),
        },
    );
    let state = files_listed(state, list_b, vec![entry("index.js", 10)]);

    assert_eq!(
        state.view().artifacts,
        ArtifactsView::Files {
            files: vec![entry("index.js", 10)],
            open: None
        }
    );
}

#[test]
fn clicking_an_unlisted_path_does_nothing() {
    init_logging();
    let state = with_files("a");
    let (state, effects) = update(
        state,
        Msg::FileClicked {
            path: "../etc/passwd".to_string(),
        },
    );
    assert!(effects.is_empty());
    assert!(matches!(
        state.view().artifacts,
        ArtifactsView::Files { open: None, .. }
    ));
}
