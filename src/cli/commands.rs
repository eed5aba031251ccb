use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gig", about = concat!("gigboard v", env!("CARGO_PKG_VERSION"), " - clients and projects from the terminal"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// API base URL (overrides config and GIGBOARD_API_URL)
    #[arg(long = "api-url", global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Config file to read instead of the default location
    #[arg(short = 'c', long = "config", global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Sign in and remember the session
    Login(LoginArgs),
    /// Create an account
    Register(RegisterArgs),
    /// Sign out and forget the session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Check that the server is reachable
    Health,
    /// List clients
    Clients(ClientsArgs),
    /// Manage a single client
    Client(ClientCmd),
    /// Show the project board
    Board(BoardArgs),
    /// Manage a single project
    Project(ProjectCmd),
    /// Write the client table and board as HTML fragments
    Render(RenderArgs),
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct LoginArgs {
    /// Account email
    pub email: String,
    /// Password
    #[arg(long, env = "GIGBOARD_PASSWORD", hide_env_values = true)]
    pub password: String,
}

#[derive(Args)]
pub struct RegisterArgs {
    /// Account email
    pub email: String,
    /// Display name
    #[arg(long)]
    pub name: Option<String>,
    /// Password
    #[arg(long, env = "GIGBOARD_PASSWORD", hide_env_values = true)]
    pub password: String,
}

// ---------------------------------------------------------------------------
// Clients
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ClientsArgs {
    /// Server-side search over client fields
    #[arg(long, short)]
    pub search: Option<String>,
}

#[derive(Args)]
pub struct ClientCmd {
    #[command(subcommand)]
    pub action: ClientAction,
}

#[derive(Subcommand)]
pub enum ClientAction {
    /// Add a client
    Add(ClientFieldArgs),
    /// Change fields of a client
    Edit(ClientEditArgs),
    /// Show client details
    Show(IdArg),
    /// Delete a client
    Rm(RmArgs),
}

#[derive(Args)]
pub struct ClientFieldArgs {
    /// Client name
    pub name: String,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

/// Omitted fields keep their current value; an empty string clears one.
#[derive(Args)]
pub struct ClientEditArgs {
    /// Client ID
    pub id: String,
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub company: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
}

// ---------------------------------------------------------------------------
// Board and projects
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BoardArgs {
    /// Match title, description or client name
    #[arg(long, short)]
    pub search: Option<String>,
    /// Only projects of this client ID
    #[arg(long)]
    pub client: Option<String>,
    /// Only these statuses (repeatable, default: all)
    #[arg(long = "status", value_name = "STATUS")]
    pub statuses: Vec<String>,
    /// Also write the board as an HTML fragment to this file
    #[arg(long, value_name = "FILE")]
    pub html: Option<PathBuf>,
}

#[derive(Args)]
pub struct ProjectCmd {
    #[command(subcommand)]
    pub action: ProjectAction,
}

#[derive(Subcommand)]
pub enum ProjectAction {
    /// Add a project
    Add(ProjectAddArgs),
    /// Change fields of a project
    Edit(ProjectEditArgs),
    /// Show project details
    Show(IdArg),
    /// Move a project to another status
    Status(ProjectStatusArgs),
    /// Delete a project
    Rm(RmArgs),
}

#[derive(Args)]
pub struct ProjectAddArgs {
    /// Owning client ID
    #[arg(long)]
    pub client: String,
    /// Project title
    pub title: String,
    #[arg(long)]
    pub description: Option<String>,
    /// idea, talks, in-progress, review, completed (default: idea)
    #[arg(long)]
    pub status: Option<String>,
    /// Hourly rate
    #[arg(long)]
    pub rate: Option<String>,
    /// Local deadline, e.g. 2025-06-01T09:30
    #[arg(long)]
    pub deadline: Option<String>,
}

/// Omitted fields keep their current value; an empty string clears one.
#[derive(Args)]
pub struct ProjectEditArgs {
    /// Project ID
    pub id: String,
    #[arg(long)]
    pub client: Option<String>,
    #[arg(long)]
    pub title: Option<String>,
    #[arg(long)]
    pub description: Option<String>,
    #[arg(long)]
    pub status: Option<String>,
    #[arg(long)]
    pub rate: Option<String>,
    #[arg(long)]
    pub deadline: Option<String>,
}

#[derive(Args)]
pub struct ProjectStatusArgs {
    /// Project ID
    pub id: String,
    /// Target status
    pub status: String,
}

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct IdArg {
    pub id: String,
}

#[derive(Args)]
pub struct RmArgs {
    pub id: String,
    /// Skip the confirmation prompt
    #[arg(long, short)]
    pub yes: bool,
}

#[derive(Args)]
pub struct RenderArgs {
    /// Directory for clients.html and board.html
    #[arg(long, value_name = "DIR")]
    pub out: PathBuf,
}
