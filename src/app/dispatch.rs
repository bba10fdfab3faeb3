use crate::app::status::{render_health, render_status};
use crate::cli::commands::{Cli, Commands, DebateCommands};
use anyhow::{Context, Result, bail};
use axon_console::Config;
use axon_console::axon::{AnalysisRequest, AxonAdapter, create_adapter};
use axon_console::debate::{
    DebateConfig, DebateRunner, DebateSession, DebateStore, DebateView, IgnoredReason,
    Participant, SqliteDebateStore, StepOutcome, TurnOutcome, parse_deep_link, share_url,
};
use std::sync::Arc;
use tracing::info;

struct App {
    config: Config,
    adapter: Arc<AxonAdapter>,
}

impl App {
    fn new(config: Config) -> Result<Self> {
        let adapter = create_adapter(&config.axon).context("Failed to build AXON adapter")?;
        Ok(Self {
            config,
            adapter: Arc::new(adapter),
        })
    }

    fn runner(&self) -> DebateRunner {
        DebateRunner::new(Arc::clone(&self.adapter), &self.config.debate.project_id)
            .with_model(self.config.axon.model.clone())
            .with_language(Some(self.config.axon.language.clone()))
    }

    async fn store(&self) -> Result<SqliteDebateStore> {
        let path = self.config.db_path();
        SqliteDebateStore::open(&path)
            .await
            .with_context(|| format!("Failed to open debate store at {}", path.display()))
    }
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    let app = App::new(config)?;

    match cli.command {
        Commands::Health => {
            let health = app.adapter.health().await;
            println!("{}", render_health(&health));
            Ok(())
        }

        Commands::Status => {
            let health = app.adapter.health().await;
            println!(
                "{}",
                render_status(&app.config, app.adapter.provider_name(), &health)
            );
            Ok(())
        }

        Commands::Analyze {
            prompt,
            project,
            mode,
            language,
        } => {
            let request = AnalysisRequest {
                project_id: project.unwrap_or_else(|| app.config.debate.project_id.clone()),
                prompt,
                mode,
                language: language.unwrap_or_else(|| app.config.axon.language.clone()),
            };
            let response = app.adapter.analyze(&request).await?;
            println!("{}", response.content);
            if let Some(usage) = response.usage {
                info!(
                    id = response.id.as_str(),
                    model = response.model.as_deref().unwrap_or("-"),
                    total_tokens = usage.total_tokens,
                    "Analysis complete"
                );
            }
            Ok(())
        }

        Commands::Debate { debate_command } => handle_debate(&app, debate_command).await,
    }
}

async fn handle_debate(app: &App, command: DebateCommands) -> Result<()> {
    let store = app.store().await?;

    match command {
        DebateCommands::New {
            title,
            topic,
            description,
            participants,
            rounds,
        } => {
            let session = DebateSession::create(DebateConfig {
                title,
                topic,
                description,
                participants: participants.iter().map(|p| Participant::parse(p)).collect(),
                max_rounds: rounds.unwrap_or(app.config.debate.default_rounds),
            })?;
            store.save(&session).await?;
            info!(debate = session.id.as_str(), "Debate created");
            println!("{}", session.id);
            Ok(())
        }

        DebateCommands::Start { id } => control(app, &store, &id, DebateRunner::start).await,
        DebateCommands::Pause { id } => control(app, &store, &id, DebateRunner::pause).await,
        DebateCommands::Resume { id } => control(app, &store, &id, DebateRunner::resume).await,
        DebateCommands::Stop { id } => control(app, &store, &id, DebateRunner::stop).await,

        DebateCommands::Turn { id } => {
            let mut view = DebateView::editable(store.load(&id).await?);
            match app.runner().generate_turn(&mut view).await? {
                TurnOutcome::Spoke(message) => {
                    store.save(view.session()).await?;
                    println!(
                        "[{}.{}] {}:\n{}",
                        message.round,
                        message.turn,
                        message.speaker.as_deref().unwrap_or("-"),
                        message.content
                    );
                    println!("{}", view.round_display());
                }
                TurnOutcome::Skipped(reason) => println!("No turn: {reason}"),
            }
            Ok(())
        }

        DebateCommands::Run { id } => {
            let mut view = DebateView::editable(store.load(&id).await?);
            let runner = app.runner();
            let mut produced = 0usize;
            loop {
                match runner.generate_turn(&mut view).await {
                    Ok(TurnOutcome::Spoke(_)) => {
                        produced += 1;
                        store.save(view.session()).await?;
                    }
                    Ok(TurnOutcome::Skipped(reason)) => {
                        if produced == 0 {
                            println!("No turn: {reason}");
                        }
                        break;
                    }
                    Err(e) => return Err(e).context("Debate run interrupted"),
                }
            }
            println!("{}", view.render());
            Ok(())
        }

        DebateCommands::Show { target } => {
            let view = match parse_deep_link(&target) {
                Some(id) => DebateView::read_only(store.load(&id).await?),
                None => DebateView::editable(store.load(target.trim()).await?),
            };
            print!("{}", view.render());
            Ok(())
        }

        DebateCommands::Share { id, base } => {
            let session = store.load(&id).await?;
            let base = url::Url::parse(&base).with_context(|| format!("Invalid base URL: {base}"))?;
            println!("{}", share_url(&base, &session.id));
            Ok(())
        }

        DebateCommands::List => {
            let summaries = store.list().await?;
            if summaries.is_empty() {
                println!("No debates yet.");
            }
            for summary in summaries {
                println!(
                    "{}  {:<10} Round: {}/{}  {:>3} msgs  {}",
                    summary.id,
                    summary.status.to_string(),
                    summary.current_round,
                    summary.max_rounds,
                    summary.message_count,
                    summary.title
                );
            }
            Ok(())
        }

        DebateCommands::Delete { id } => {
            if !store.delete(&id).await? {
                bail!("Debate {id} not found");
            }
            println!("Deleted {id}");
            Ok(())
        }
    }
}

async fn control(
    app: &App,
    store: &SqliteDebateStore,
    id: &str,
    action: fn(&DebateRunner, &mut DebateView) -> StepOutcome,
) -> Result<()> {
    let mut view = DebateView::editable(store.load(id).await?);
    match action(&app.runner(), &mut view) {
        StepOutcome::Applied => {
            store.save(view.session()).await?;
            println!("{} [{}]", view.round_display(), view.session().status);
        }
        StepOutcome::Ignored(IgnoredReason::ReadOnly) => println!("Session is read-only"),
        StepOutcome::Ignored(reason) => println!("Nothing to do: {reason}"),
    }
    Ok(())
}
