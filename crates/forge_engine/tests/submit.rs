use forge_engine::{
    ApiSettings, FailureKind, JobMode, JobStatus, JobSubmitter, NewJob, ReqwestForgeApi,
    SubmissionError,
};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn api_for(server: &MockServer) -> ReqwestForgeApi {
    ReqwestForgeApi::new(ApiSettings {
        base_url: server.uri(),
        ..ApiSettings::default()
    })
    .expect("valid base url")
}

#[tokio::test]
async fn missing_status_defaults_to_queued() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(json!({
            "project_name": "todo",
            "spec": "build a todo app",
            "mode": "create",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j1"})))
        .expect(1)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let handle = JobSubmitter::new(&api)
        .submit(NewJob::create("todo", "build a todo app"))
        .await
        .expect("submitted");
    assert_eq!(handle.id, "j1");
    assert_eq!(handle.status, JobStatus::Queued);
    assert_eq!(handle.project_name, "todo");
}

#[tokio::test]
async fn reported_status_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"job_id": "j2", "status": "running"})),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    let handle = JobSubmitter::new(&api)
        .submit(NewJob::create("todo", "spec"))
        .await
        .expect("submitted");
    assert_eq!(handle.status, JobStatus::Running);
}

#[tokio::test]
async fn modify_sends_project_id_and_given_name() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .and(body_json(json!({
            "project_name": "project_0f1e2d3c",
            "spec": "add login",
            "project_id": "0f1e2d3c4b5a",
            "mode": "modify",
            "stack": "fastapi",
            "max_iters": 3,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "j3"})))
        .expect(1)
        .mount(&server)
        .await;

    let job = NewJob {
        project_name: "project_0f1e2d3c".to_string(),
        spec: "add login".to_string(),
        mode: JobMode::Modify,
        project_id: Some("0f1e2d3c4b5a".to_string()),
        stack: Some("fastapi".to_string()),
        max_iters: Some(3),
    };

    let api = api_for(&server);
    let handle = JobSubmitter::new(&api).submit(job).await.expect("submitted");
    assert_eq!(handle.project_name, "project_0f1e2d3c");
}

#[tokio::test]
async fn invalid_jobs_never_reach_the_server() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"job_id": "x"})))
        .expect(0)
        .mount(&server)
        .await;

    let api = api_for(&server);
    let submitter = JobSubmitter::new(&api);

    let mut modify = NewJob::create("project_p1", "change it");
    modify.mode = JobMode::Modify;
    assert_eq!(
        submitter.submit(modify).await,
        Err(SubmissionError::MissingProjectId)
    );

    let mut create = NewJob::create("todo", "spec");
    create.project_id = Some("p1".to_string());
    assert_eq!(
        submitter.submit(create).await,
        Err(SubmissionError::UnexpectedProjectId)
    );

    assert_eq!(
        submitter.submit(NewJob::create("todo", "  ")).await,
        Err(SubmissionError::EmptySpec)
    );
}

#[tokio::test]
async fn server_rejection_surfaces_the_detail() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/jobs"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Unknown stack: cobol"})),
        )
        .mount(&server)
        .await;

    let api = api_for(&server);
    let err = JobSubmitter::new(&api)
        .submit(NewJob::create("todo", "spec"))
        .await
        .unwrap_err();
    match err {
        SubmissionError::Api(api_err) => {
            assert_eq!(api_err.kind, FailureKind::HttpStatus(400));
            assert_eq!(api_err.message, "Unknown stack: cobol");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
