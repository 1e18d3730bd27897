use crate::cli::{Cli, Commands, SessionCommands};
use crate::config::{Config, StorageBackend};
use crate::gateway::{AppState, run_gateway};
use crate::llm::create_generator;
use crate::session::limits::checked_session_id;
use crate::session::{InMemorySessionStore, SessionController, SessionStore, SqliteSessionStore};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

/// Open the configured session store.
pub async fn build_store(config: &Config) -> Result<Arc<dyn SessionStore>> {
    match config.storage.backend {
        StorageBackend::Sqlite => {
            let path = config.storage_path();
            let store = SqliteSessionStore::open(&path)
                .await
                .with_context(|| format!("open session database {}", path.display()))?;
            Ok(Arc::new(store))
        }
        StorageBackend::Memory => {
            info!("using in-memory session store; state is lost on exit");
            Ok(Arc::new(InMemorySessionStore::new()))
        }
    }
}

/// Wire generator, store and policy into a controller.
pub async fn build_controller(config: &Config) -> Result<SessionController> {
    let generator = create_generator(&config.llm).context("create generator")?;
    let store = build_store(config).await?;
    let controller = SessionController::new(generator, store, config.session.clone())
        .context("build session controller")?
        .with_debug(config.debug);
    Ok(controller)
}

pub async fn dispatch(cli: Cli, mut config: Config) -> Result<()> {
    match cli.command {
        Commands::Serve { host, port } => {
            if let Some(host) = host {
                config.gateway.host = host;
            }
            if let Some(port) = port {
                config.gateway.port = port;
            }

            let controller = build_controller(&config).await?;
            info!(
                provider = config.llm.provider.as_str(),
                model = %config.llm.model,
                "starting gateway"
            );
            let state = AppState {
                controller: Arc::new(controller),
            };
            run_gateway(&config.gateway, state).await
        }

        Commands::Chat { session, message } => {
            let session = checked_session_id(&session)?;
            let controller = build_controller(&config).await?;
            let reply = controller.handle_turn(session, &message).await?;
            println!("{}", reply.reply);
            println!();
            println!(
                "profile: {}",
                serde_json::to_string_pretty(&reply.profile).context("encode profile")?
            );
            Ok(())
        }

        Commands::Session {
            session_command: SessionCommands::Show { id },
        } => {
            let controller = build_controller(&config).await?;
            match controller.snapshot(&id).await? {
                Some(state) => println!(
                    "{}",
                    serde_json::to_string_pretty(&state).context("encode session state")?
                ),
                None => println!("No stored state for session {id}"),
            }
            Ok(())
        }
    }
}
