//! taskdeck - command-line client for a hosted to-do service
//!
//! Sign up, confirm, sign in against a hosted identity provider, then
//! create, list, edit and delete personal tasks over the task REST API.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

use taskdeck::auth::{CognitoProvider, IdentityClient, IdentityProvider};
use taskdeck::config::Config;
use taskdeck::controllers::{LoginController, SubmitOutcome, TaskFilter, TaskListController};
use taskdeck::guard::{AuthGuard, GuardDecision, Route};
use taskdeck::models::TaskStatus;
use taskdeck::session::SessionStore;
use taskdeck::tasks::{self, TaskClient};

#[derive(Parser)]
#[command(name = "taskdeck")]
#[command(about = "Command-line client for a hosted to-do service")]
#[command(version)]
struct Cli {
    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new config file
    Init {
        /// Output path for config file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Register a new account
    Register {
        /// Email address to register
        email: String,
    },

    /// Confirm a registration with the emailed code
    Confirm {
        email: String,
        code: String,
    },

    /// Sign in
    Login {
        email: String,
    },

    /// Sign out and clear the cached session
    Logout,

    /// Show the signed-in identity
    Whoami,

    /// Request or complete a password reset
    ResetPassword {
        email: String,

        /// Reset code from the email; omit to request one
        #[arg(long)]
        code: Option<String>,
    },

    /// List tasks
    List {
        /// all, completed, pending or expired
        #[arg(short, long, default_value = "all")]
        filter: String,
    },

    /// Add a task
    Add {
        description: String,

        /// Optional display date
        #[arg(long)]
        date: Option<String>,
    },

    /// Mark a task completed
    Done { id: String },

    /// Mark a completed task pending again
    Reopen { id: String },

    /// Edit a task's description and/or status
    Edit {
        id: String,

        #[arg(long)]
        description: Option<String>,

        /// Pending, Completed or Expired
        #[arg(long)]
        status: Option<String>,
    },

    /// Delete a task (asks for confirmation)
    Rm {
        id: String,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("taskdeck=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    if let Commands::Init { output } = &cli.command {
        let path = output
            .clone()
            .unwrap_or_else(|| PathBuf::from("config.toml"));
        let cfg = Config::default();
        cfg.save_to(&path)?;

        println!("Created config file: {}", path.display());
        println!();
        println!("Next steps:");
        println!("  1. Set identity.client_id and api.base_url in the file");
        println!("  2. Register an account: taskdeck register <email>");
        println!("  3. Sign in: taskdeck login <email>");
        return Ok(());
    }

    let cfg = if let Some(path) = &cli.config {
        Config::load_from(path)?
    } else {
        Config::load()?
    };

    let session = SessionStore::new();
    let identity = build_identity(&cfg, session)?;
    let task_client = TaskClient::new(&cfg.api.base_url, identity.clone());
    let guard = AuthGuard::new(identity.clone());

    match cli.command {
        Commands::Init { .. } => unreachable!("handled above"),

        Commands::Register { email } => {
            let mut login = LoginController::new(identity);
            login.toggle_mode(); // register mode
            login.email.set(email);
            login.password.set(prompt_password("Password")?);

            match login.submit().await {
                SubmitOutcome::AwaitingConfirmation => {
                    if let Some(message) = login.success_message() {
                        println!("{message}");
                    }
                    let code = prompt("Confirmation code (leave blank to confirm later)")?;
                    if code.is_empty() {
                        println!("Run 'taskdeck confirm <email> <code>' once you have the code.");
                        return Ok(());
                    }
                    login.confirmation_code.set(code);
                    match login.submit().await {
                        SubmitOutcome::Confirmed => {
                            if let Some(message) = login.success_message() {
                                println!("{message}");
                            }
                        }
                        _ => print_form_problems(&login),
                    }
                }
                SubmitOutcome::Registered => {
                    if let Some(message) = login.success_message() {
                        println!("{message}");
                    }
                }
                _ => print_form_problems(&login),
            }
        }

        Commands::Confirm { email, code } => {
            let outcome = identity.confirm_sign_up(&email, &code).await?;
            println!("{}", outcome.message);
        }

        Commands::Login { email } => {
            let mut login = LoginController::new(identity.clone());
            login.email.set(email);
            login.password.set(prompt_password("Password")?);

            match login.submit().await {
                SubmitOutcome::SignedIn => {
                    println!("Sign-in successful!");
                    if let Some(user) = identity.session().current_user() {
                        println!("Signed in as {}", user.username);
                    }
                }
                _ => print_form_problems(&login),
            }
        }

        Commands::Logout => {
            identity.sign_out().await?;
            println!("Signed out.");
        }

        Commands::Whoami => match identity.current_user().await {
            Some(user) => {
                println!("{}", user.username);
                println!("user id: {}", user.user_id);
            }
            None => println!("Not signed in."),
        },

        Commands::ResetPassword { email, code } => match code {
            None => {
                let outcome = identity.reset_password(&email).await?;
                println!("{}", outcome.message);
                println!("Complete it with: taskdeck reset-password {email} --code <code>");
            }
            Some(code) => {
                let new_password = prompt_password("New password")?;
                let outcome = identity
                    .confirm_reset_password(&email, &code, &new_password)
                    .await?;
                println!("{}", outcome.message);
            }
        },

        Commands::List { filter } => {
            let Some(mut controller) = open_task_view(&guard, &task_client).await? else {
                return Ok(());
            };
            let filter: TaskFilter = filter.parse().map_err(anyhow::Error::msg)?;
            controller.set_filter(filter);

            let tasks = controller.filtered_tasks();
            if tasks.is_empty() {
                println!("No tasks.");
            } else {
                for task in tasks {
                    println!(
                        "{}  [{}]  {}  (due {}, {})",
                        task.task_id,
                        task.status,
                        task.description,
                        tasks::format_deadline(task.deadline),
                        tasks::time_remaining(task.deadline),
                    );
                }
            }
            println!(
                "\n{} pending, {} completed, {} expired",
                controller.pending_count(),
                controller.completed_count(),
                controller.expired_count(),
            );
        }

        Commands::Add { description, date } => {
            let Some(mut controller) = open_task_view(&guard, &task_client).await? else {
                return Ok(());
            };
            controller.form.description.set(description);
            controller.form.date = date.unwrap_or_default();

            if controller.create_task().await {
                // Newest first, so the created task is at the front.
                if let Some(task) = controller.tasks.first() {
                    println!("Created task {}", task.task_id);
                }
            } else {
                print_task_error(&controller);
            }
        }

        Commands::Done { id } => {
            let Some(mut controller) = open_task_view(&guard, &task_client).await? else {
                return Ok(());
            };
            if controller.update_status(&id, TaskStatus::Completed).await {
                println!("Task {id} completed.");
            } else {
                print_task_error(&controller);
            }
        }

        Commands::Reopen { id } => {
            let Some(mut controller) = open_task_view(&guard, &task_client).await? else {
                return Ok(());
            };
            if controller.update_status(&id, TaskStatus::Pending).await {
                println!("Task {id} reopened.");
            } else {
                print_task_error(&controller);
            }
        }

        Commands::Edit {
            id,
            description,
            status,
        } => {
            let Some(mut controller) = open_task_view(&guard, &task_client).await? else {
                return Ok(());
            };
            controller.start_edit(&id);
            if controller.editing_task_id().is_none() {
                println!("No task with id {id}.");
                return Ok(());
            }

            if let Some(description) = description {
                controller.edit_form.description.set(description);
            }
            if let Some(status) = status {
                controller.edit_form.status =
                    status.parse::<TaskStatus>().map_err(anyhow::Error::msg)?;
            }

            if controller.save_edit().await {
                println!("Task {id} updated.");
            } else {
                print_task_error(&controller);
            }
        }

        Commands::Rm { id, yes } => {
            let Some(mut controller) = open_task_view(&guard, &task_client).await? else {
                return Ok(());
            };
            controller.request_delete(&id);

            if !yes {
                let answer = prompt("Are you sure you want to delete this task? [y/N]")?;
                if !answer.eq_ignore_ascii_case("y") {
                    controller.cancel_delete();
                    println!("Kept task {id}.");
                    return Ok(());
                }
            }

            if controller.confirm_delete().await {
                println!("Deleted task {id}.");
            } else {
                print_task_error(&controller);
            }
        }
    }

    Ok(())
}

fn build_identity(
    cfg: &Config,
    session: SessionStore,
) -> Result<IdentityClient<CognitoProvider>> {
    let cache_path = Config::session_cache_path()?;
    let provider = CognitoProvider::new(&cfg.identity.endpoint, &cfg.identity.client_id)
        .with_token_cache(cache_path);
    Ok(IdentityClient::new(provider, session))
}

/// Guard the protected task view, then load the task list into a controller.
/// `None` means the guard redirected to login.
async fn open_task_view<P: IdentityProvider>(
    guard: &AuthGuard<P>,
    client: &TaskClient<P>,
) -> Result<Option<TaskListController<P>>> {
    match guard.can_activate(Route::Tasks).await {
        GuardDecision::RedirectToLogin => {
            println!("Not signed in. Run 'taskdeck login <email>' first.");
            Ok(None)
        }
        GuardDecision::Allow => {
            let mut controller = TaskListController::new(client.clone());
            if !controller.load().await {
                let message = controller
                    .error_message()
                    .unwrap_or("Failed to load tasks")
                    .to_string();
                anyhow::bail!(message);
            }
            Ok(Some(controller))
        }
    }
}

fn print_form_problems<P: IdentityProvider>(login: &LoginController<P>) {
    if let Some(message) = login.error_message() {
        println!("{message}");
        return;
    }
    let field_errors = [
        login.email_error(),
        login.password_error(),
        login.confirmation_code_error(),
    ];
    for error in field_errors.into_iter().flatten() {
        println!("{error}");
    }
}

fn print_task_error<P: IdentityProvider>(controller: &TaskListController<P>) {
    println!(
        "{}",
        controller.error_message().unwrap_or("Operation failed")
    );
}

fn prompt(label: &str) -> Result<String> {
    print!("{label}: ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .read_line(&mut line)
        .context("Failed to read input")?;
    Ok(line.trim().to_string())
}

fn prompt_password(label: &str) -> Result<String> {
    // Plain stdin read; the input echoes. Good enough for a terminal client.
    prompt(label)
}
