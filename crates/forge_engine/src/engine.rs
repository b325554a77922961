use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use forge_logging::{forge_debug, forge_info};

use crate::api::{ApiSettings, ForgeApi, ReqwestForgeApi};
use crate::artifacts::ArtifactFetcher;
use crate::chat::{await_messages, ChatReloadSettings};
use crate::poller::{spawn_poller, ChannelTickSink, PollerHandle};
use crate::submit::{JobSubmitter, NewJob};
use crate::{ApiError, EngineEvent, JobStatus, Ticket};

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub api: ApiSettings,
    pub poll_interval: Duration,
    pub chat_reload: ChatReloadSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            poll_interval: Duration::from_millis(1000),
            chat_reload: ChatReloadSettings::default(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("cannot create api client: {0}")]
    Api(#[from] ApiError),
    #[error("cannot start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    StartPoller,
    StopPoller,
    ListJobs {
        ticket: Ticket,
    },
    FetchJob {
        ticket: Ticket,
        job_id: String,
    },
    SubmitJob {
        ticket: Ticket,
        job: NewJob,
    },
    ListFiles {
        ticket: Ticket,
        job_id: String,
        status: JobStatus,
    },
    ReadFile {
        ticket: Ticket,
        job_id: String,
        path: String,
    },
    LoadMessages {
        ticket: Ticket,
        project_id: String,
    },
    /// Reloads messages until more than `baseline` are visible or the reload times out.
    AwaitMessages {
        ticket: Ticket,
        project_id: String,
        baseline: usize,
    },
    SetProvider {
        ticket: Ticket,
        provider: String,
    },
    ListProjects {
        ticket: Ticket,
    },
    CheckHealth {
        ticket: Ticket,
    },
}

/// Owns a background thread running a tokio runtime. Commands go in, events come out.
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
    event_rx: mpsc::Receiver<EngineEvent>,
}

impl EngineHandle {
    pub fn new(settings: EngineSettings) -> Result<Self, EngineError> {
        let api = ReqwestForgeApi::new(settings.api.clone())?;
        Self::with_api(Arc::new(api), settings)
    }

    pub fn with_api(api: Arc<dyn ForgeApi>, settings: EngineSettings) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        thread::spawn(move || {
            let mut poller: Option<PollerHandle> = None;
            while let Ok(command) = cmd_rx.recv() {
                match command {
                    EngineCommand::StartPoller => {
                        if poller.is_none() {
                            let sink = ChannelTickSink::new(event_tx.clone());
                            poller = Some(spawn_poller(
                                runtime.handle(),
                                settings.poll_interval,
                                sink,
                            ));
                        }
                    }
                    EngineCommand::StopPoller => {
                        if let Some(handle) = poller.take() {
                            handle.stop();
                        }
                    }
                    command => {
                        let api = api.clone();
                        let event_tx = event_tx.clone();
                        let chat_reload = settings.chat_reload;
                        runtime.spawn(async move {
                            let event = handle_command(api.as_ref(), command, chat_reload).await;
                            if let Some(event) = event {
                                let _ = event_tx.send(event);
                            }
                        });
                    }
                }
            }
            forge_info!(target: "forge::engine", "command channel closed, engine stopping");
        });

        Ok(Self { cmd_tx, event_rx })
    }

    pub fn send(&self, command: EngineCommand) {
        forge_debug!(target: "forge::engine", "command {:?}", command);
        let _ = self.cmd_tx.send(command);
    }

    pub fn try_recv(&self) -> Option<EngineEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<EngineEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}

async fn handle_command(
    api: &dyn ForgeApi,
    command: EngineCommand,
    chat_reload: ChatReloadSettings,
) -> Option<EngineEvent> {
    let event = match command {
        EngineCommand::StartPoller | EngineCommand::StopPoller => return None,
        EngineCommand::ListJobs { ticket } => EngineEvent::JobsListed {
            ticket,
            result: api.list_jobs().await,
        },
        EngineCommand::FetchJob { ticket, job_id } => {
            let result = api.get_job(&job_id).await;
            EngineEvent::JobFetched {
                ticket,
                job_id,
                result,
            }
        }
        EngineCommand::SubmitJob { ticket, job } => EngineEvent::JobSubmitted {
            ticket,
            result: JobSubmitter::new(api).submit(job).await,
        },
        EngineCommand::ListFiles {
            ticket,
            job_id,
            status,
        } => {
            let result = ArtifactFetcher::new(api).list_files(&job_id, status).await;
            EngineEvent::FilesListed {
                ticket,
                job_id,
                result,
            }
        }
        EngineCommand::ReadFile {
            ticket,
            job_id,
            path,
        } => {
            let result = ArtifactFetcher::new(api).read_file(&job_id, &path).await;
            EngineEvent::FileRead {
                ticket,
                job_id,
                path,
                result,
            }
        }
        EngineCommand::LoadMessages { ticket, project_id } => {
            let result = api.get_messages(&project_id).await;
            EngineEvent::MessagesLoaded {
                ticket,
                project_id,
                result,
            }
        }
        EngineCommand::AwaitMessages {
            ticket,
            project_id,
            baseline,
        } => {
            let result = await_messages(api, &project_id, baseline, chat_reload)
                .await
                .map(|reload| {
                    if !reload.visible {
                        forge_info!(
                            target: "forge::engine",
                            "delivering {} messages of {} without the sent one",
                            reload.messages.len(),
                            project_id
                        );
                    }
                    reload.messages
                });
            EngineEvent::MessagesLoaded {
                ticket,
                project_id,
                result,
            }
        }
        EngineCommand::SetProvider { ticket, provider } => EngineEvent::ProviderSet {
            ticket,
            result: api.set_provider(&provider).await,
        },
        EngineCommand::ListProjects { ticket } => EngineEvent::ProjectsListed {
            ticket,
            result: api.list_projects().await,
        },
        EngineCommand::CheckHealth { ticket } => EngineEvent::HealthChecked {
            ticket,
            result: api.health().await,
        },
    };
    Some(event)
}
