use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use taskman_protocol::{
    ContactMessage, NewTask, Period, Plan, ProfileUpdate, SubscribeRequest, TaskLabel, TaskPatch,
};

use crate::auth::AuthService;
use crate::billing::BillingService;
use crate::config::{CliConfig, ConfigService};
use crate::contact::ContactService;
use crate::dashboard::DashboardService;
use crate::error::{Result, TaskmanError};
use crate::profile::ProfileService;
use crate::session::Session;
use crate::tasks::TaskService;
use crate::templates::{self, TemplateService};
use crate::ui::UI;
use crate::version::{format_version_info, CURRENT_VERSION};

#[derive(Parser)]
#[command(
    name = "taskman",
    about = "Task Manager command line client",
    long_about = "Task Manager - plan daily tasks from the terminal

WORKFLOW:
  1. Sign up or log in
  2. Add tasks, or create them from a template
  3. Track progress on the dashboard

QUICK START:
  taskman login                         # Log in and store your session
  taskman tasks list                    # Tasks due today
  taskman tasks add \"Write report\"      # Add a task due today
  taskman tasks done 42                 # Mark a task as completed
  taskman dashboard --period week       # Weekly statistics
  taskman status                        # Check your session",
    version = CURRENT_VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this config file instead of the default one
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with username and password
    Login(LoginArgs),

    /// Create an account
    Signup(SignupArgs),

    /// Forget the stored session
    Logout,

    /// Show session status
    #[command(aliases = &["st"])]
    Status,

    /// Mail a temporary password
    ResetPassword(ResetPasswordArgs),

    /// Manage tasks
    #[command(subcommand)]
    Tasks(TaskCommand),

    /// Manage task templates
    #[command(subcommand)]
    Templates(TemplateCommand),

    /// Show statistics
    Dashboard(DashboardArgs),

    /// Manage your profile and account
    #[command(subcommand)]
    Profile(ProfileCommand),

    /// Subscription status and checkout
    #[command(subcommand)]
    Billing(BillingCommand),

    /// Send a message to the team
    Contact(ContactArgs),

    /// Configure settings
    #[command(subcommand)]
    #[command(aliases = &["cfg"])]
    Config(ConfigCommand),
}

#[derive(Args)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: Option<String>,
}

#[derive(Args)]
pub struct SignupArgs {
    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct ResetPasswordArgs {
    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// List tasks due on a date (today by default)
    #[command(aliases = &["ls"])]
    List {
        #[arg(short, long)]
        date: Option<NaiveDate>,

        /// Every task regardless of due date
        #[arg(short, long, conflicts_with = "date")]
        all: bool,
    },

    /// Recently created tasks
    Recent,

    /// Your task history, newest first
    History {
        #[arg(short, long, default_value_t = 1)]
        page: u32,
    },

    /// Add a task
    Add(AddTaskArgs),

    /// Mark a task as completed
    Done { id: i64 },

    /// Mark a task as not completed
    Undone { id: i64 },

    /// Change a task
    Edit(EditTaskArgs),

    /// Delete a task
    #[command(aliases = &["remove"])]
    Rm {
        id: i64,

        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Args)]
pub struct AddTaskArgs {
    pub title: Option<String>,

    /// Due date, YYYY-MM-DD (today by default)
    #[arg(short = 'D', long)]
    pub due: Option<NaiveDate>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(short, long)]
    pub label: Option<TaskLabel>,
}

#[derive(Args)]
pub struct EditTaskArgs {
    pub id: i64,

    #[arg(short, long)]
    pub title: Option<String>,

    #[arg(short = 'D', long)]
    pub due: Option<NaiveDate>,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(short, long)]
    pub category: Option<String>,

    #[arg(short, long)]
    pub label: Option<TaskLabel>,
}

#[derive(Subcommand)]
pub enum TemplateCommand {
    #[command(aliases = &["ls"])]
    List,

    /// Create a template from a JSON file
    Create {
        #[arg(short, long)]
        file: PathBuf,
    },

    /// Replace a template with the contents of a JSON file
    Update {
        id: i64,

        #[arg(short, long)]
        file: PathBuf,
    },

    #[command(aliases = &["remove"])]
    Rm {
        id: i64,

        #[arg(short, long)]
        force: bool,
    },

    /// Create the template's tasks starting from a date (today by default)
    Use {
        id: i64,

        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Args)]
pub struct DashboardArgs {
    /// today, week or month
    #[arg(short, long, default_value = "today")]
    pub period: Period,
}

#[derive(Subcommand)]
pub enum ProfileCommand {
    Show,

    Update {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },

    /// Upload a profile picture
    Picture { path: PathBuf },

    /// Change your password
    Password,

    /// Delete your account
    Delete {
        #[arg(short, long)]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum BillingCommand {
    Status,

    /// Purchase a plan
    Subscribe {
        /// monthly or yearly
        #[arg(short, long)]
        plan: Plan,
    },
}

#[derive(Args)]
pub struct ContactArgs {
    #[arg(short, long)]
    pub subject: Option<String>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,
    SetApiBase { url: String },
    SetTimeout { seconds: u64 },
    SetVerbose { enabled: String },
    Reset,
}

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: UI,
}

impl CliHandler {
    pub fn new(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: UI::new(),
        }
    }

    async fn load_config(&self) -> Result<CliConfig> {
        if let Some(path) = &self.config_path {
            CliConfig::load_from(path).await
        } else {
            CliConfig::load().await
        }
    }

    async fn open_session(&self) -> Result<Session> {
        let config = self.load_config().await?;
        Session::new(config.to_client_config()?)
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        if let Commands::Config(command) = command {
            return self.handle_config(command).await;
        }

        let session = self.open_session().await?;
        if needs_password_warning(&command) && session.store().must_change_password() {
            self.ui.warning(
                "You logged in with a temporary password. Run `taskman profile password` to set a new one.",
            );
        }

        match command {
            Commands::Login(args) => self.handle_login(&session, args).await,
            Commands::Signup(args) => self.handle_signup(&session, args).await,
            Commands::Logout => self.handle_logout(&session),
            Commands::Status => self.handle_status(&session),
            Commands::ResetPassword(args) => self.handle_reset_password(&session, args).await,
            Commands::Tasks(command) => self.handle_tasks(&session, command).await,
            Commands::Templates(command) => self.handle_templates(&session, command).await,
            Commands::Dashboard(args) => self.handle_dashboard(&session, args).await,
            Commands::Profile(command) => self.handle_profile(&session, command).await,
            Commands::Billing(command) => self.handle_billing(&session, command).await,
            Commands::Contact(args) => self.handle_contact(&session, args).await,
            Commands::Config(_) => Ok(()),
        }
    }

    /// Print a failed command's error with a hint on what to do next
    pub fn report_error(&self, err: &TaskmanError) {
        self.ui.error(&format!("Error: {}", err));
        if err.is_auth_error() {
            self.ui.info("Please log in with `taskman login`.");
        } else if err.is_subscription_required() {
            self.ui.info(
                "A subscription is required. See `taskman billing status` and `taskman billing subscribe --plan monthly`.",
            );
        }
    }

    async fn handle_login(&mut self, session: &Session, args: LoginArgs) -> Result<()> {
        let username = match args.username {
            Some(username) => username,
            None => self.ui.input("Username")?,
        };
        let password = self.ui.password("Password")?;

        let spinner = self.ui.spinner("Logging in...");
        let result = AuthService::new(session).login(&username, &password).await;
        spinner.finish_and_clear();

        if result? {
            self.ui.warning("You logged in with a temporary password.");
            let new_password = self.ui.new_password()?;
            let detail = ProfileService::new(session)
                .change_password("", &new_password)
                .await?;
            self.ui.success(&detail);
        } else {
            self.ui.success(&format!("Logged in as {}", username));
        }
        Ok(())
    }

    async fn handle_signup(&mut self, session: &Session, args: SignupArgs) -> Result<()> {
        let username = match args.username {
            Some(username) => username,
            None => self.ui.input("Username")?,
        };
        let email = match args.email {
            Some(email) => email,
            None => self.ui.input("Email")?,
        };
        let password = self.ui.new_password()?;

        AuthService::new(session)
            .signup(&username, &email, &password)
            .await?;
        self.ui.success(&format!("Welcome, {}! Your trial has started.", username));
        Ok(())
    }

    fn handle_logout(&mut self, session: &Session) -> Result<()> {
        AuthService::new(session).logout()?;
        self.ui.success("Logged out");
        Ok(())
    }

    fn handle_status(&mut self, session: &Session) -> Result<()> {
        let status = AuthService::new(session).status();

        let expired = !status.authenticated && status.has_refresh_token;
        let mut rows = vec![
            ("Version", format_version_info()),
            (
                "Authentication",
                self.ui.format_auth_status(status.authenticated, expired),
            ),
        ];
        if let Some(expires_at) = status.access_expires_at {
            rows.push((
                "Access token expires",
                expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string(),
            ));
        }
        if status.must_change_password {
            rows.push(("Password", "change required".to_string()));
        }
        rows.push(("Server", status.api_base));
        rows.push(("Session file", self.ui.format_field(status.storage_path)));

        self.ui.card("Status", rows);
        Ok(())
    }

    async fn handle_reset_password(&mut self, session: &Session, args: ResetPasswordArgs) -> Result<()> {
        let email = match args.email {
            Some(email) => email,
            None => self.ui.input("Email")?,
        };
        let detail = AuthService::new(session)
            .request_password_reset(&email)
            .await?;
        self.ui.info(&detail);
        Ok(())
    }

    async fn handle_tasks(&mut self, session: &Session, command: TaskCommand) -> Result<()> {
        let service = TaskService::new(session);
        match command {
            TaskCommand::List { date, all } => {
                let tasks = if all {
                    service.list_all().await?
                } else {
                    let date = date.unwrap_or_else(today);
                    self.ui.header(&format!("Tasks for {}", date.format("%A, %B %-d")));
                    service.list_for_date(date).await?
                };
                self.ui.task_table(&tasks);
            }
            TaskCommand::Recent => {
                let tasks = service.recent().await?;
                self.ui.task_table(&tasks);
            }
            TaskCommand::History { page } => {
                let list = service.user_tasks(page).await?;
                let has_next = list.has_next();
                self.ui.task_table(&list.into_items());
                if has_next {
                    self.ui.info(&format!("More: taskman tasks history --page {}", page + 1));
                }
            }
            TaskCommand::Add(args) => {
                let title = match args.title {
                    Some(title) => title,
                    None => self.ui.input("Title")?,
                };
                let task = service
                    .create(&NewTask {
                        title,
                        description: args.description.unwrap_or_default(),
                        due_date: args.due.unwrap_or_else(today),
                        category: args.category.unwrap_or_default(),
                        label: args.label.unwrap_or_default(),
                    })
                    .await?;
                self.ui.success(&format!("Added task {}: {}", task.id, task.title));
            }
            TaskCommand::Done { id } => {
                let task = service.set_completed(id, true).await?;
                self.ui.success(&format!("Completed: {}", task.title));
            }
            TaskCommand::Undone { id } => {
                let task = service.set_completed(id, false).await?;
                self.ui.success(&format!("Reopened: {}", task.title));
            }
            TaskCommand::Edit(args) => {
                let patch = TaskPatch {
                    title: args.title,
                    description: args.description,
                    completed: None,
                    due_date: args.due,
                    category: args.category,
                    label: args.label,
                };
                let task = service.update(args.id, &patch).await?;
                self.ui.task_table(std::slice::from_ref(&task));
            }
            TaskCommand::Rm { id, force } => {
                if !force && !self.ui.confirm(&format!("Delete task {}?", id))? {
                    return Err(TaskmanError::user_cancelled());
                }
                service.delete(id).await?;
                self.ui.success(&format!("Deleted task {}", id));
            }
        }
        Ok(())
    }

    async fn handle_templates(&mut self, session: &Session, command: TemplateCommand) -> Result<()> {
        let service = TemplateService::new(session);
        match command {
            TemplateCommand::List => {
                let list = service.list().await?;
                self.ui.template_list(&list);
            }
            TemplateCommand::Create { file } => {
                let draft = templates::load_draft(&file).await?;
                let template = service.create(draft).await?;
                self.ui.success(&format!(
                    "Created template {} ({} items)",
                    template.name,
                    template.items.len()
                ));
            }
            TemplateCommand::Update { id, file } => {
                let draft = templates::load_draft(&file).await?;
                let template = service.update(id, draft).await?;
                self.ui.success(&format!("Updated template {}", template.name));
            }
            TemplateCommand::Rm { id, force } => {
                if !force && !self.ui.confirm(&format!("Delete template {}?", id))? {
                    return Err(TaskmanError::user_cancelled());
                }
                service.delete(id).await?;
                self.ui.success(&format!("Deleted template {}", id));
            }
            TemplateCommand::Use { id, date } => {
                let created = service.instantiate(id, date.unwrap_or_else(today)).await?;
                self.ui.success(&format!("Created {} tasks", created.tasks.len()));
                if let Some(first) = created.earliest_due_date() {
                    self.ui.info(&format!("First due: {}", first));
                }
                self.ui.task_table(&created.tasks);
            }
        }
        Ok(())
    }

    async fn handle_dashboard(&mut self, session: &Session, args: DashboardArgs) -> Result<()> {
        let spinner = self.ui.spinner("Loading statistics...");
        let result = DashboardService::new(session).stats(args.period).await;
        spinner.finish_and_clear();
        let stats = result?;

        let mut rows = vec![
            ("Total", stats.total_tasks.to_string()),
            ("Completed", stats.completed_tasks.to_string()),
            ("Pending", stats.pending_tasks.to_string()),
            ("Completion", format!("{}%", stats.completion_rate)),
            (
                "Plan",
                format!("{} ({})", stats.subscription_plan, stats.subscription_status),
            ),
        ];
        if stats.trial_days_remaining > 0 {
            rows.push(("Trial days left", stats.trial_days_remaining.to_string()));
        }
        self.ui.card(&format!("Dashboard: {}", args.period), rows);

        if !stats.tasks_by_category.is_empty() {
            let rows = stats
                .tasks_by_category
                .iter()
                .map(|(category, count)| (category.as_str(), count.to_string()))
                .collect();
            self.ui.card("By category", rows);
        }
        Ok(())
    }

    async fn handle_profile(&mut self, session: &Session, command: ProfileCommand) -> Result<()> {
        let service = ProfileService::new(session);
        match command {
            ProfileCommand::Show => {
                let profile = service.get().await?;
                self.ui.card(
                    "Profile",
                    vec![
                        ("Name", profile.display_name()),
                        ("Username", profile.username.clone()),
                        ("Email", self.ui.format_field(Some(profile.email.clone()))),
                        (
                            "Member since",
                            profile.date_joined.format("%Y-%m-%d").to_string(),
                        ),
                        ("Picture", self.ui.format_field(profile.profile_picture.clone())),
                    ],
                );
            }
            ProfileCommand::Update {
                email,
                first_name,
                last_name,
            } => {
                let profile = service
                    .update(&ProfileUpdate {
                        email,
                        first_name,
                        last_name,
                    })
                    .await?;
                self.ui.success(&format!("Profile updated for {}", profile.display_name()));
            }
            ProfileCommand::Picture { path } => {
                let spinner = self.ui.spinner("Uploading...");
                let result = service.upload_picture(&path).await;
                spinner.finish_and_clear();
                result?;
                self.ui.success("Profile picture updated");
            }
            ProfileCommand::Password => {
                let old_password = if session.store().must_change_password() {
                    String::new()
                } else {
                    self.ui.password_optional("Current password")?
                };
                let new_password = self.ui.new_password()?;
                let detail = service.change_password(&old_password, &new_password).await?;
                self.ui.success(&detail);
            }
            ProfileCommand::Delete { force } => {
                if !force
                    && !self
                        .ui
                        .confirm("Delete your account and all of its tasks? This cannot be undone")?
                {
                    return Err(TaskmanError::user_cancelled());
                }
                service.delete_account().await?;
                self.ui.success("Account deleted");
            }
        }
        Ok(())
    }

    async fn handle_billing(&mut self, session: &Session, command: BillingCommand) -> Result<()> {
        let service = BillingService::new(session);
        let subscription = match command {
            BillingCommand::Status => service.status().await?,
            BillingCommand::Subscribe { plan } => {
                let card_number = self.ui.input("Card number")?;
                let expiry = self.ui.input("Expiry (MM/YY)")?;
                let cvc = self.ui.password("CVC")?;
                let subscription = service
                    .subscribe(&SubscribeRequest {
                        plan,
                        card_number,
                        expiry,
                        cvc,
                    })
                    .await?;
                self.ui.success("Subscription active");
                subscription
            }
        };

        let mut rows = vec![
            ("Plan", subscription.plan.to_string()),
            ("Status", subscription.status.to_string()),
            ("Started", subscription.start_date.to_string()),
            ("Ends", subscription.end_date.to_string()),
            ("Days left", subscription.days_remaining.to_string()),
        ];
        if let Some(transaction_id) = subscription.transaction_id {
            rows.push(("Transaction", transaction_id));
        }
        self.ui.card("Subscription", rows);
        Ok(())
    }

    async fn handle_contact(&mut self, session: &Session, args: ContactArgs) -> Result<()> {
        let name = self.ui.input("Your name")?;
        let email = self.ui.input("Your email")?;
        let subject = match args.subject {
            Some(subject) => subject,
            None => self.ui.input("Subject")?,
        };
        let message = self.ui.input("Message")?;

        let reply = ContactService::new(session.http())
            .send(&ContactMessage {
                name,
                email,
                subject,
                message,
            })
            .await?;
        self.ui.success(&reply);
        Ok(())
    }

    async fn handle_config(&mut self, command: ConfigCommand) -> Result<()> {
        let config = self.load_config().await?;
        let mut service = if let Some(path) = self.config_path.clone() {
            ConfigService::with_config_path(config, path)
        } else {
            ConfigService::new(config)
        };
        service.handle_config(command).await
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Commands that still work while a password change is pending
fn needs_password_warning(command: &Commands) -> bool {
    !matches!(
        command,
        Commands::Login(_)
            | Commands::Signup(_)
            | Commands::Logout
            | Commands::Profile(ProfileCommand::Password)
            | Commands::Config(_)
    )
}
