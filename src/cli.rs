use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context};
use chrono::{NaiveDate, Utc};
use chrono_tz::Tz;
use clap::{Parser, Subcommand};
use tracing::warn;

use crate::calendar::{CalendarView, WeekLayout};
use crate::clients::{ChronosApi, ChronosClient};
use crate::config::Settings;
use crate::errors::ChronosError;
use crate::models::api::SpeechToTextResponse;
use crate::models::event::transform_events;
use crate::runtime::{run_chat, ChatRuntime};
use crate::service::preferences::Preferences;
use crate::service::session::{require_auth, Session};
use crate::service::storage::LocalStore;

#[derive(Parser)]
#[command(name = "chronos", version, about = "Terminal client for the Chronos scheduling assistant")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Store the session token handed out by the login page
    Login {
        #[arg(long)]
        token: String,
    },
    Logout {},
    /// Ask the backend whether the session is authenticated
    Status {},
    /// Print the week grid
    Week {
        /// Any day inside the week to show (YYYY-MM-DD), defaults to today
        #[arg(long)]
        date: Option<NaiveDate>,
        /// Weeks to move forward (or backward when negative)
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        offset: i64,
    },
    /// Submit one scheduling request and wait for it to finish
    Schedule {
        query: String,
    },
    Chat {},
    Prefs {
        #[command(subcommand)]
        action: PrefsAction,
    },
    Search {
        query: String,
    },
    /// Edit or delete an event with a natural-language instruction
    Edit {
        query: String,
        #[arg(long)]
        event_id: String,
    },
    /// Transcribe an audio file, optionally scheduling the result
    Transcribe {
        file: PathBuf,
        #[arg(long)]
        schedule: bool,
    },
    Welcome {},
}

#[derive(Subcommand)]
enum PrefsAction {
    List,
    Add { preference: String },
    /// Remove by the 1-based position shown in `prefs list`
    Remove { position: usize },
}

pub async fn run(settings: Settings) -> anyhow::Result<()> {
    let cli = Cli::parse();
    let store = LocalStore::new(&settings.store_location);

    match cli.command {
        Commands::Login { token } => {
            Session::login(&store, &token)?;
            println!("Logged in.");
            return Ok(());
        }
        Commands::Logout {} => {
            Session::restore(&store)?.logout(&store)?;
            println!("Logged out.");
            return Ok(());
        }
        Commands::Prefs { action } => return run_prefs(store, action),
        _ => {}
    }

    let session = Session::restore(&store)?;
    let api: Arc<dyn ChronosApi> = Arc::new(ChronosClient::new(&settings.api_url, session)?);

    if let Commands::Status {} = cli.command {
        let status = api.auth_status().await?;
        if status.is_authenticated {
            println!("Authenticated against {}", settings.api_url);
        } else {
            println!("Not logged in. Sign in at {}", settings.login_url);
        }
        return Ok(());
    }

    if !ensure_auth(api.as_ref(), &settings).await? {
        return Ok(());
    }

    match cli.command {
        Commands::Week { date, offset } => show_week(api.as_ref(), &settings, date, offset).await?,
        Commands::Schedule { query } => schedule_once(api, &settings, &store, &query).await?,
        Commands::Chat {} => {
            let preferences = Preferences::load(store)?;
            run_chat(api, &settings, &preferences).await?;
        }
        Commands::Search { query } => search(api.as_ref(), &query).await?,
        Commands::Edit { query, event_id } => edit(api.as_ref(), &settings, &query, &event_id).await?,
        Commands::Transcribe { file, schedule } => {
            transcribe(api, &settings, &store, file, schedule).await?
        }
        Commands::Welcome {} => welcome(api.as_ref(), settings.timezone).await?,
        Commands::Login { .. } | Commands::Logout {} | Commands::Prefs { .. } | Commands::Status {} => {}
    }
    Ok(())
}

/// Prints the login target and returns `false` when the session is not
/// authenticated.
async fn ensure_auth(api: &dyn ChronosApi, settings: &Settings) -> anyhow::Result<bool> {
    match require_auth(api, &settings.login_url).await {
        Ok(()) => Ok(true),
        Err(ChronosError::Unauthenticated { login_url }) => {
            println!("Please log in at {} and run `chronos login --token <token>`.", login_url);
            Ok(false)
        }
        Err(err) => Err(err.into()),
    }
}

fn run_prefs(store: LocalStore, action: PrefsAction) -> anyhow::Result<()> {
    let mut preferences = Preferences::load(store)?;
    match action {
        PrefsAction::List => {
            if preferences.items().is_empty() {
                println!("No scheduling preferences saved.");
            }
            for (idx, item) in preferences.items().iter().enumerate() {
                println!("{}. {}", idx + 1, item);
            }
        }
        PrefsAction::Add { preference } => {
            if preferences.add(&preference)? {
                println!("Added preference.");
            } else {
                println!("Nothing to add.");
            }
        }
        PrefsAction::Remove { position } => {
            let index = position
                .checked_sub(1)
                .ok_or_else(|| anyhow!("positions start at 1"))?;
            let removed = preferences.remove(index)?;
            println!("Removed \"{}\".", removed);
        }
    }
    Ok(())
}

async fn show_week(
    api: &dyn ChronosApi,
    settings: &Settings,
    date: Option<NaiveDate>,
    offset: i64,
) -> anyhow::Result<()> {
    let raw = api.list_events().await?;
    let events = transform_events(&raw, settings.timezone);
    let mut view = match date {
        Some(date) => CalendarView::new(date, settings.timezone),
        None => CalendarView::starting_today(Utc::now(), settings.timezone),
    };
    view.shift_weeks(offset)?;
    print!("{}", render_week(&view.label(), &view.layout(&events), settings.timezone));
    Ok(())
}

/// Plain-text rendering of a week: one block per day with each event's local
/// time range, title and grid placement.
pub fn render_week(label: &str, layout: &WeekLayout, tz: Tz) -> String {
    let mut out = format!("{}\n", label);
    for day in &layout.days {
        out.push_str(&format!("\n{} {}\n", day.weekday, day.date.format("%b %-d")));
        if day.events.is_empty() {
            out.push_str("  (no events)\n");
        }
        for placed in &day.events {
            out.push_str(&format!(
                "  {}-{}  {}  [top {}px, height {}px]\n",
                placed.event.start.with_timezone(&tz).format("%H:%M"),
                placed.event.end.with_timezone(&tz).format("%H:%M"),
                placed.event.title,
                placed.top,
                placed.height
            ));
        }
    }
    out
}

async fn schedule_once(
    api: Arc<dyn ChronosApi>,
    settings: &Settings,
    store: &LocalStore,
    query: &str,
) -> anyhow::Result<()> {
    let preferences = Preferences::load(store.clone())?;
    let runtime = ChatRuntime::new(api, settings);
    runtime.send(query, preferences.snapshot()).await;
    Ok(())
}

async fn search(api: &dyn ChronosApi, query: &str) -> anyhow::Result<()> {
    let response = api.search(query).await?;
    if let Some(answer) = response.answer {
        println!("{}", answer);
    }
    for hit in &response.events {
        println!(
            "- {} ({} - {})",
            hit.title.as_deref().unwrap_or("(No title)"),
            hit.start.as_deref().unwrap_or("?"),
            hit.end.as_deref().unwrap_or("?")
        );
    }
    Ok(())
}

async fn edit(api: &dyn ChronosApi, settings: &Settings, query: &str, event_id: &str) -> anyhow::Result<()> {
    let raw = api.list_events().await?;
    let events = transform_events(&raw, settings.timezone);
    let event = events
        .iter()
        .find(|event| event.id == event_id)
        .with_context(|| format!("no event with id {}", event_id))?;

    let response = api.edit_or_delete(query, event).await?;
    let message = response.message.as_deref().unwrap_or_default();
    if response.is_soft_failure() {
        warn!(event_id, "edit request was not understood");
        println!("Warning: {}", message);
    } else {
        println!("{}", if message.is_empty() { "Done." } else { message });
    }
    Ok(())
}

async fn transcribe(
    api: Arc<dyn ChronosApi>,
    settings: &Settings,
    store: &LocalStore,
    file: PathBuf,
    schedule: bool,
) -> anyhow::Result<()> {
    let bytes = tokio::fs::read(&file)
        .await
        .with_context(|| format!("failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "audio.webm".to_string());

    match api.speech_to_text(bytes, &file_name).await? {
        SpeechToTextResponse::Transcribed { text } => {
            println!("{}", text);
            if schedule {
                schedule_once(api, settings, store, &text).await?;
            }
        }
        SpeechToTextResponse::Failed { error } => println!("Transcription failed: {}", error),
    }
    Ok(())
}

async fn welcome(api: &dyn ChronosApi, tz: Tz) -> anyhow::Result<()> {
    let raw = api.list_events().await?;
    if transform_events(&raw, tz).is_empty() {
        println!("Your calendar is empty.");
        return Ok(());
    }
    if let Some(message) = api.welcome_message(&raw).await? {
        println!("{}", message);
    }
    Ok(())
}
