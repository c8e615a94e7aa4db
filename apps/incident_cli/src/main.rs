use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use client_core::{HttpTransport, MutationController, TableSurface, UiCommand};
use shared::domain::{IncidentId, IncidentStatus};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::mpsc::{self, UnboundedSender},
};
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod shell;

type Controller = Arc<MutationController<TableSurface>>;

#[derive(Parser, Debug)]
#[command(name = "incident-cli", about = "List, create and update incidents")]
struct Cli {
    /// Base address of the incident API.
    #[arg(long, env = "INCIDENT_API_BASE", default_value = "http://localhost:5000")]
    server_url: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the incident table.
    List,
    /// Create an `open` incident and print the refreshed table.
    Create {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Change an incident's status through its row selector.
    SetStatus { id: i64, status: IncidentStatus },
    /// Interactive session; type `help` for commands.
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    debug!(server_url = %cli.server_url, "incident cli starting");

    let transport = Arc::new(HttpTransport::new(&cli.server_url)?);
    let (commands_tx, mut commands_rx) = mpsc::unbounded_channel();
    let controller = MutationController::new(transport, TableSurface::new(), commands_tx.clone());

    match cli.command.unwrap_or(Command::List) {
        Command::List => {
            controller.on_ready().await?;
            print_table(&controller).await;
        }
        Command::Create { title, description } => {
            let incident = controller.create(&title, &description).await?;
            println!("created incident {}", incident.id);
            print_table(&controller).await;
        }
        Command::SetStatus { id, status } => {
            controller.on_ready().await?;
            select_status(&controller, IncidentId(id), status).await?;
            let command = commands_rx
                .recv()
                .await
                .ok_or_else(|| anyhow!("command queue closed"))?;
            match command {
                UiCommand::UpdateStatus { id, status } => {
                    controller.update_status(id, status).await?;
                }
                other => bail!("unexpected command from selector: {other:?}"),
            }
            print_table(&controller).await;
        }
        Command::Shell => {
            let worker = controller.spawn_command_loop(commands_rx);
            // A failed initial load is logged; the session stays usable.
            let _ = controller.on_ready().await;
            print_table(&controller).await;
            let session = run_shell(&controller, &commands_tx).await;
            drop(commands_tx);
            // Commands typed before quitting still reach the server.
            worker.shutdown().await?;
            session?;
        }
    }

    Ok(())
}

async fn print_table(controller: &Controller) {
    print!("{}", *controller.surface().await);
}

/// Fires the selector of the row showing `id`, as a user picking a status
/// would.
async fn select_status(
    controller: &Controller,
    id: IncidentId,
    status: IncidentStatus,
) -> Result<()> {
    let mut surface = controller.surface().await;
    let row = surface
        .row_for(id)
        .map(|(row, _)| row)
        .ok_or_else(|| anyhow!("no incident with id {id} in the table"))?;
    surface.select(row, status);
    Ok(())
}

async fn run_shell(controller: &Controller, commands: &UnboundedSender<UiCommand>) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match shell::parse(&line) {
            Ok(shell::Input::Empty) => {}
            Ok(shell::Input::Help) => println!("{}", shell::HELP),
            Ok(shell::Input::Quit) => break,
            Ok(shell::Input::Show) => print_table(controller).await,
            Ok(shell::Input::Refresh) => {
                commands.send(UiCommand::Refresh)?;
            }
            Ok(shell::Input::Add { title, description }) => {
                {
                    let mut form = controller.form().await;
                    form.title = title;
                    form.description = description;
                }
                commands.send(UiCommand::SubmitForm)?;
            }
            Ok(shell::Input::Set { id, status }) => {
                if let Err(err) = select_status(controller, id, status).await {
                    println!("{err}");
                }
            }
            Err(err) => println!("{err}"),
        }
    }
    Ok(())
}
