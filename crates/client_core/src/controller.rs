//! Create/update orchestration. Every successful mutation is followed by a
//! full refetch; nothing is merged locally.

use std::sync::Arc;

use shared::{
    domain::{Incident, IncidentId, IncidentStatus},
    protocol::{incident_path, CreateIncidentRequest, UpdateStatusRequest, INCIDENTS_PATH},
};
use tokio::{
    sync::{
        mpsc::{UnboundedReceiver, UnboundedSender},
        oneshot, Mutex, MutexGuard,
    },
    task::{JoinError, JoinHandle, JoinSet},
};
use tracing::{error, info};

use crate::{
    error::TransportError,
    render::{RenderSurface, Renderer},
    store::IncidentStoreProxy,
    transport::{decode, describe, encode, Method, Transport},
};

/// Actions a rendering host can ask for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiCommand {
    Refresh,
    SubmitForm,
    Create { title: String, description: String },
    UpdateStatus { id: IncidentId, status: IncidentStatus },
}

/// The "add incident" form. `status` is the hidden field and stays `open`
/// unless a host changes it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IncidentForm {
    pub title: String,
    pub description: String,
    pub status: IncidentStatus,
}

impl IncidentForm {
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

pub struct MutationController<S: RenderSurface> {
    transport: Arc<dyn Transport>,
    store: IncidentStoreProxy,
    renderer: Renderer,
    surface: Mutex<S>,
    form: Mutex<IncidentForm>,
}

impl<S: RenderSurface + 'static> MutationController<S> {
    /// `commands` is where row selectors send their status changes; feed the
    /// matching receiver to [`Self::spawn_command_loop`].
    pub fn new(
        transport: Arc<dyn Transport>,
        surface: S,
        commands: UnboundedSender<UiCommand>,
    ) -> Arc<Self> {
        Arc::new(Self {
            store: IncidentStoreProxy::new(Arc::clone(&transport)),
            transport,
            renderer: Renderer::new(commands),
            surface: Mutex::new(surface),
            form: Mutex::new(IncidentForm::default()),
        })
    }

    pub async fn surface(&self) -> MutexGuard<'_, S> {
        self.surface.lock().await
    }

    pub async fn form(&self) -> MutexGuard<'_, IncidentForm> {
        self.form.lock().await
    }

    /// Initial load once the host is ready.
    pub async fn on_ready(&self) -> Result<usize, TransportError> {
        self.refresh().await
    }

    /// Refetches the list and re-renders it. On failure the surface keeps
    /// whatever it showed before.
    pub async fn refresh(&self) -> Result<usize, TransportError> {
        let incidents = self.store.list().await.map_err(|err| {
            error!(error = %err, "error fetching incidents");
            err
        })?;

        let mut surface = self.surface.lock().await;
        self.renderer.render(&mut *surface, &incidents);
        info!(rows = incidents.len(), "incident table refreshed");
        Ok(incidents.len())
    }

    /// Creates an `open` incident. Inputs are trimmed but never rejected.
    pub async fn create(
        &self,
        title: &str,
        description: &str,
    ) -> Result<Incident, TransportError> {
        self.create_with_status(title, description, IncidentStatus::Open)
            .await
    }

    /// Submits the form as it currently reads, hidden status included.
    pub async fn submit_form(&self) -> Result<Incident, TransportError> {
        let form = self.form.lock().await.clone();
        self.create_with_status(&form.title, &form.description, form.status)
            .await
    }

    async fn create_with_status(
        &self,
        title: &str,
        description: &str,
        status: IncidentStatus,
    ) -> Result<Incident, TransportError> {
        let operation = describe(Method::Post, INCIDENTS_PATH);
        let request = CreateIncidentRequest {
            title: Some(title.trim().to_string()),
            description: Some(description.trim().to_string()),
            status: Some(status),
        };

        let result = async {
            let body = encode(&operation, &request)?;
            let value = self
                .transport
                .request(Method::Post, INCIDENTS_PATH, Some(body))
                .await?;
            decode::<Incident>(&operation, value)
        }
        .await;

        match result {
            Ok(incident) => {
                info!(incident_id = incident.id.0, "incident created");
                // A failed refresh is already logged and must not undo the create.
                let _ = self.refresh().await;
                self.form.lock().await.reset();
                Ok(incident)
            }
            Err(err) => {
                error!(error = %err, "error adding incident");
                Err(err)
            }
        }
    }

    /// Sends `status` verbatim; any transition is allowed. On failure the
    /// selector may keep showing the rejected value until the next refresh.
    pub async fn update_status(
        &self,
        id: IncidentId,
        status: IncidentStatus,
    ) -> Result<Incident, TransportError> {
        let path = incident_path(id);
        let operation = describe(Method::Put, &path);
        let request = UpdateStatusRequest {
            status: Some(status),
        };

        let result = async {
            let body = encode(&operation, &request)?;
            let value = self
                .transport
                .request(Method::Put, &path, Some(body))
                .await?;
            decode::<Incident>(&operation, value)
        }
        .await;

        match result {
            Ok(incident) => {
                info!(incident_id = id.0, %status, "incident status updated");
                let _ = self.refresh().await;
                Ok(incident)
            }
            Err(err) => {
                error!(incident_id = id.0, error = %err, "error updating incident status");
                Err(err)
            }
        }
    }

    /// Runs one command to completion. Failures are logged by the operation
    /// itself.
    pub async fn dispatch(&self, command: UiCommand) {
        match command {
            UiCommand::Refresh => {
                let _ = self.refresh().await;
            }
            UiCommand::SubmitForm => {
                let _ = self.submit_form().await;
            }
            UiCommand::Create { title, description } => {
                let _ = self.create(&title, &description).await;
            }
            UiCommand::UpdateStatus { id, status } => {
                let _ = self.update_status(id, status).await;
            }
        }
    }

    /// Executes each incoming command on its own task, so a second refresh
    /// does not wait for the first; whichever response lands last renders
    /// last. [`CommandLoop::shutdown`] stops intake and waits for every
    /// queued and running command.
    pub fn spawn_command_loop(
        self: &Arc<Self>,
        mut commands: UnboundedReceiver<UiCommand>,
    ) -> CommandLoop {
        let controller = Arc::clone(self);
        let (stop_tx, mut stop_rx) = oneshot::channel::<()>();
        let handle = tokio::spawn(async move {
            let mut tasks = JoinSet::new();
            let mut stopping = false;
            loop {
                tokio::select! {
                    command = commands.recv() => {
                        let Some(command) = command else { break };
                        let controller = Arc::clone(&controller);
                        tasks.spawn(async move { controller.dispatch(command).await });
                    }
                    _ = &mut stop_rx, if !stopping => {
                        // Already queued commands are still received.
                        stopping = true;
                        commands.close();
                    }
                    Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                        log_task_failure(joined);
                    }
                }
            }

            let pending = tasks.len();
            if pending > 0 {
                info!(pending, "waiting for in-flight commands");
            }
            while let Some(joined) = tasks.join_next().await {
                log_task_failure(joined);
            }
        });

        CommandLoop {
            stop: stop_tx,
            handle,
        }
    }
}

fn log_task_failure(joined: Result<(), JoinError>) {
    if let Err(err) = joined {
        error!(error = %err, "command task failed");
    }
}

/// Handle to a running command loop. Dropping it without calling
/// [`Self::shutdown`] also stops intake, but nothing waits for the loop.
pub struct CommandLoop {
    stop: oneshot::Sender<()>,
    handle: JoinHandle<()>,
}

impl CommandLoop {
    /// Closes the queue, runs whatever was already queued and waits for all
    /// commands to finish.
    pub async fn shutdown(self) -> Result<(), JoinError> {
        let Self { stop, handle } = self;
        let _ = stop.send(());
        handle.await
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
