// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Fitness-Tracker command line client
//!
//! A thin driver over the client core: every invocation restores the
//! persisted session, refreshes the workout collection and prints the
//! requested view as plain text.

use anyhow::Context;
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use fitness_tracker::{
    config::Config,
    error::AppError,
    models::{Exercise, Workout, WorkoutDraft},
    AppState,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "fitness-tracker", version, about = "Plan and track your weekly workouts")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        name: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Reload workouts and report how many there are
    Refresh,
    /// Show the week, Monday first
    Week,
    /// Show today's workout
    Today,
    /// Show one workout in detail
    Show {
        #[arg(long)]
        id: String,
        #[arg(long)]
        date: NaiveDate,
    },
    /// Schedule a workout
    Add {
        /// Date as YYYY-MM-DD
        #[arg(long)]
        date: String,
        #[arg(long)]
        category: String,
        /// Start time as HH:MM
        #[arg(long)]
        from: String,
        /// End time as HH:MM
        #[arg(long)]
        to: String,
        /// Exercise as NAME:SETSxREPS, e.g. "Squat:3x10" (repeatable)
        #[arg(long = "exercise", value_parser = parse_exercise)]
        exercises: Vec<Exercise>,
    },
    /// Mark a workout done, or undo it
    Toggle {
        #[arg(long)]
        id: String,
        #[arg(long)]
        date: NaiveDate,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    let config = Config::from_env().context("Failed to load configuration")?;
    let app = AppState::from_config(&config).context("Failed to initialize client")?;
    tracing::debug!(api = %config.api_base_url, offline = config.offline, "Client initialized");

    if let Err(e) = run(&app, cli.command).await {
        if e.is_user_facing() {
            eprintln!("{}", e.user_message());
            std::process::exit(1);
        }
        return Err(e.into());
    }
    Ok(())
}

async fn run(app: &AppState, command: Command) -> Result<(), AppError> {
    match command {
        Command::Login { email, password } => {
            let identity = app.sessions.login(&email, &password).await?;
            println!("Signed in as {}", identity.display_name());
        }
        Command::Register {
            email,
            password,
            name,
        } => {
            let identity = app.sessions.register(&email, &password, &name).await?;
            println!("Welcome, {}", identity.display_name());
        }
        Command::Logout => {
            app.logout()?;
            println!("Signed out");
        }
        Command::Whoami => match app.sessions.current_valid() {
            Some(identity) => println!("{} (id {})", identity.display_name(), identity.id),
            None => println!("Not signed in"),
        },
        Command::Refresh => {
            require_session(app)?;
            let workouts = app.workouts.refresh().await;
            let source = if app.workouts.is_remote() { "server" } else { "local storage" };
            println!("{} workout(s) loaded from {}", workouts.len(), source);
        }
        Command::Week => {
            require_session(app)?;
            app.workouts.refresh().await;
            for slot in app.views.week_view() {
                match &slot.workout {
                    Some(w) => println!("{:<10} {}", slot.day_name(), summary(w)),
                    None => println!("{:<10} No workout", slot.day_name()),
                }
            }
        }
        Command::Today => {
            require_session(app)?;
            app.workouts.refresh().await;
            match app.views.today_workout() {
                Some(w) => print_detail(&w),
                None => println!("No workout scheduled for today"),
            }
        }
        Command::Show { id, date } => {
            require_session(app)?;
            app.workouts.refresh().await;
            let workout = app
                .views
                .detail(&id, date)
                .ok_or_else(|| AppError::NotFound(format!("{} on {}", id, date)))?;
            print_detail(&workout);
        }
        Command::Add {
            date,
            category,
            from,
            to,
            exercises,
        } => {
            require_session(app)?;
            let draft = WorkoutDraft {
                date,
                category,
                time_from: from,
                time_to: to,
                exercises,
            };
            let id = app.workouts.add(&draft).await?;
            println!("Workout added (id {})", id);
        }
        Command::Toggle { id, date } => {
            require_session(app)?;
            app.workouts.refresh().await;
            let completed = app.workouts.toggle_completion(&id, date).await?;
            println!("{}", if completed { "Completed" } else { "Not completed" });
        }
    }
    Ok(())
}

fn require_session(app: &AppState) -> Result<(), AppError> {
    app.sessions
        .current_valid()
        .map(|_| ())
        .ok_or_else(|| AppError::Auth("Please sign in first".to_string()))
}

fn summary(workout: &Workout) -> String {
    format!(
        "{} {}-{} ({} exercises) [{}] id={} date={}",
        workout.category,
        workout.time_from,
        workout.time_to,
        workout.exercises.len(),
        if workout.completed { "x" } else { " " },
        workout.id,
        workout.date,
    )
}

fn print_detail(workout: &Workout) {
    println!("Category:  {}", workout.category);
    println!("Date:      {}", workout.date.format("%d.%m.%Y"));
    println!("Time:      {} - {}", workout.time_from, workout.time_to);
    println!(
        "Status:    {}",
        if workout.completed { "Completed" } else { "Not completed" }
    );
    println!("Exercises:");
    for (i, exercise) in workout.exercises.iter().enumerate() {
        println!(
            "  {}. {} {} x {}",
            i + 1,
            exercise.name,
            exercise.sets,
            exercise.reps
        );
    }
}

/// Parse `NAME:SETSxREPS`.
fn parse_exercise(value: &str) -> Result<Exercise, String> {
    let (name, scheme) = value
        .rsplit_once(':')
        .ok_or_else(|| "expected NAME:SETSxREPS".to_string())?;
    let (sets, reps) = scheme
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected SETSxREPS after ':'".to_string())?;

    Ok(Exercise {
        name: name.trim().to_string(),
        sets: sets.trim().parse().map_err(|_| format!("invalid sets: {}", sets))?,
        reps: reps.trim().parse().map_err(|_| format!("invalid reps: {}", reps))?,
    })
}

/// Initialize structured JSON logging on stderr.
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true)
        .with_writer(std::io::stderr);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("fitness_tracker=debug,info"));

    tracing_subscriber::registry().with(filter).with(format).init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_subcommand_parses() {
        let cli = Cli::try_parse_from(["fitness-tracker", "refresh"]).unwrap();
        assert!(matches!(cli.command, Command::Refresh));
    }

    #[test]
    fn test_parse_exercise() {
        let exercise = parse_exercise("Bench press:4x8").unwrap();
        assert_eq!(exercise, Exercise::new("Bench press", 4, 8));
        assert!(parse_exercise("Squat").is_err());
        assert!(parse_exercise("Squat:threex10").is_err());
    }
}
