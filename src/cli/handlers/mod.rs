use std::error::Error;
use std::fs;
use std::io::StdinLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{Local, Utc};
use serde::Serialize;

use crate::api::{ApiClient, ApiError, AuthRedirect};
use crate::app::confirm::PromptConfirm;
use crate::app::toast::ToastKind;
use crate::app::{Dispatcher, Outcome};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::session::{self, Session};
use crate::model::{AppConfig, ProjectStatus};
use crate::ops::filter::FilterState;
use crate::render::html::{CLIENTS_LOAD_FAILED, PROJECTS_LOAD_FAILED};

type CliResult = Result<(), Box<dyn Error>>;
type CliDispatcher = Dispatcher<PromptConfirm<StdinLock<'static>>>;

/// Settings shared by every command
struct Context {
    config: AppConfig,
    session_path: PathBuf,
    json: bool,
}

/// Forgets the stored session and tells the user to sign in again.
struct SessionRedirect {
    session_path: PathBuf,
}

impl AuthRedirect for SessionRedirect {
    fn redirect_to_login(&self) {
        session::clear_session(&self.session_path);
        eprintln!("Session expired or missing. Run `gig login <email>` to sign in.");
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(cli: Cli) -> CliResult {
    let config = config_io::load_config(cli.config.as_deref(), cli.api_url.as_deref())?;
    let session_path =
        session::default_session_path().ok_or("could not determine a data directory")?;
    tracing::debug!(base_url = %config.server.base_url, "loaded config");

    let ctx = Context {
        config,
        session_path,
        json: cli.json,
    };

    match cli.command {
        // Auth
        Commands::Login(args) => cmd_login(&ctx, args).await,
        Commands::Register(args) => cmd_register(&ctx, args).await,
        Commands::Logout => cmd_logout(&ctx).await,
        Commands::Whoami => cmd_whoami(&ctx).await,
        Commands::Health => cmd_health(&ctx).await,

        // Clients
        Commands::Clients(args) => cmd_clients(&ctx, args).await,
        Commands::Client(cmd) => match cmd.action {
            ClientAction::Add(args) => cmd_client_add(&ctx, args).await,
            ClientAction::Edit(args) => cmd_client_edit(&ctx, args).await,
            ClientAction::Show(args) => cmd_client_show(&ctx, args).await,
            ClientAction::Rm(args) => cmd_client_rm(&ctx, args).await,
        },

        // Board and projects
        Commands::Board(args) => cmd_board(&ctx, args).await,
        Commands::Project(cmd) => match cmd.action {
            ProjectAction::Add(args) => cmd_project_add(&ctx, args).await,
            ProjectAction::Edit(args) => cmd_project_edit(&ctx, args).await,
            ProjectAction::Show(args) => cmd_project_show(&ctx, args).await,
            ProjectAction::Status(args) => cmd_project_status(&ctx, args).await,
            ProjectAction::Rm(args) => cmd_project_rm(&ctx, args).await,
        },
        Commands::Render(args) => cmd_render(&ctx, args).await,
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Build a dispatcher with the saved session loaded into its cookie jar.
fn connect(ctx: &Context, assume_yes: bool) -> Result<CliDispatcher, Box<dyn Error>> {
    let redirect = Arc::new(SessionRedirect {
        session_path: ctx.session_path.clone(),
    });
    let api = ApiClient::new(&ctx.config.server, redirect)?;
    match session::read_session(&ctx.session_path) {
        Some(saved) if saved.base_url == api.base_url() => api.restore_session(&saved.cookie),
        Some(saved) => {
            tracing::debug!(saved = %saved.base_url, current = %api.base_url(), "session belongs to another server");
        }
        None => {}
    }
    Ok(Dispatcher::new(
        api,
        PromptConfirm::stdin(assume_yes),
        ctx.config.ui.clone(),
    ))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> CliResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print pending notifications, then turn the outcome into an exit status.
fn finish(ctx: &Context, d: &mut CliDispatcher, outcome: Outcome) -> CliResult {
    let toasts = d.toasts().drain();
    match outcome {
        Outcome::Done => {
            for toast in toasts.iter().filter(|t| t.kind == ToastKind::Success) {
                if ctx.json {
                    print_json(&toast_to_json(toast))?;
                } else {
                    println!("{}", format_toast(toast));
                }
            }
            Ok(())
        }
        Outcome::Cancelled => {
            eprintln!("Cancelled.");
            Ok(())
        }
        Outcome::Failed => {
            let message = toasts
                .iter()
                .rev()
                .find(|t| t.kind == ToastKind::Error)
                .map(|t| t.message.clone())
                .unwrap_or_else(|| "request failed".to_string());
            Err(message.into())
        }
        Outcome::SessionExpired => Err("not signed in".into()),
    }
}

fn api_failure(err: ApiError, action: &str) -> Box<dyn Error> {
    err.user_message(action)
        .unwrap_or_else(|| "not signed in".to_string())
        .into()
}

/// Load clients and projects; either list failing is fatal for a CLI command.
async fn load_all(d: &mut CliDispatcher) -> CliResult {
    if d.load().await == Outcome::SessionExpired {
        return Err("not signed in".into());
    }
    if d.clients_failed() {
        return Err(CLIENTS_LOAD_FAILED.into());
    }
    if d.projects_failed() {
        return Err(PROJECTS_LOAD_FAILED.into());
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> CliResult {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .map_err(|e| format!("could not create {}: {}", parent.display(), e))?;
    }
    fs::write(path, content).map_err(|e| format!("could not write {}: {}", path.display(), e))?;
    Ok(())
}

fn parse_status(s: &str) -> Result<ProjectStatus, Box<dyn Error>> {
    Ok(s.trim().parse::<ProjectStatus>()?)
}

fn set_if_some(field: &mut String, value: Option<String>) {
    if let Some(v) = value {
        *field = v;
    }
}

// ---------------------------------------------------------------------------
// Auth commands
// ---------------------------------------------------------------------------

async fn cmd_login(ctx: &Context, args: LoginArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    let user = match d.login(&args.email, &args.password).await {
        Ok(user) => user,
        Err(outcome) => return finish(ctx, &mut d, outcome),
    };
    let cookie = d
        .api()
        .session_cookie()
        .ok_or("signed in, but the server did not set a session cookie")?;
    session::write_session(
        &ctx.session_path,
        &Session {
            base_url: d.api().base_url().to_string(),
            cookie,
            email: Some(user.email.clone()),
        },
    )?;
    if ctx.json {
        d.toasts().drain();
        return print_json(&user);
    }
    finish(ctx, &mut d, Outcome::Done)
}

async fn cmd_register(ctx: &Context, args: RegisterArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    match d
        .register(&args.email, &args.password, args.name.as_deref())
        .await
    {
        Ok(user) if ctx.json => {
            d.toasts().drain();
            print_json(&user)
        }
        Ok(_) => finish(ctx, &mut d, Outcome::Done),
        Err(outcome) => finish(ctx, &mut d, outcome),
    }
}

async fn cmd_logout(ctx: &Context) -> CliResult {
    let mut d = connect(ctx, false)?;
    let outcome = d.logout().await;
    // The local session goes even when the server could not be told.
    session::clear_session(&ctx.session_path);
    finish(ctx, &mut d, outcome)
}

async fn cmd_whoami(ctx: &Context) -> CliResult {
    let mut d = connect(ctx, false)?;
    match d.current_user().await {
        Ok(user) if ctx.json => print_json(&user),
        Ok(user) => {
            match user.full_name.as_deref().filter(|n| !n.is_empty()) {
                Some(name) => println!("{} <{}>", name, user.email),
                None => println!("{}", user.email),
            }
            Ok(())
        }
        Err(outcome) => finish(ctx, &mut d, outcome),
    }
}

async fn cmd_health(ctx: &Context) -> CliResult {
    let d = connect(ctx, false)?;
    let health = d
        .api()
        .health()
        .await
        .map_err(|e| api_failure(e, "check server health"))?;
    if ctx.json {
        return print_json(&health);
    }
    println!("{}: {}", d.api().base_url(), health.status);
    Ok(())
}

// ---------------------------------------------------------------------------
// Client commands
// ---------------------------------------------------------------------------

async fn cmd_clients(ctx: &Context, args: ClientsArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    let outcome = d.search_clients(args.search.as_deref().unwrap_or("")).await;
    match outcome {
        Outcome::SessionExpired => return Err("not signed in".into()),
        _ if d.clients_failed() => return Err(CLIENTS_LOAD_FAILED.into()),
        _ => {}
    }
    if ctx.json {
        return print_json(d.cache().clients());
    }
    for line in format_client_table(d.cache().clients()) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_client_add(ctx: &Context, args: ClientFieldArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    d.client_form.open_create();
    let fields = &mut d.client_form.fields;
    fields.name = args.name;
    set_if_some(&mut fields.email, args.email);
    set_if_some(&mut fields.phone, args.phone);
    set_if_some(&mut fields.company, args.company);
    set_if_some(&mut fields.notes, args.notes);
    let outcome = d.submit_client_form().await;
    finish(ctx, &mut d, outcome)
}

async fn cmd_client_edit(ctx: &Context, args: ClientEditArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    match d.refresh_clients().await {
        Outcome::SessionExpired => return Err("not signed in".into()),
        Outcome::Failed => return Err(CLIENTS_LOAD_FAILED.into()),
        _ => {}
    }
    if !d.edit_client(&args.id) {
        return Err(format!("client not found: {}", args.id).into());
    }
    let fields = &mut d.client_form.fields;
    set_if_some(&mut fields.name, args.name);
    set_if_some(&mut fields.email, args.email);
    set_if_some(&mut fields.phone, args.phone);
    set_if_some(&mut fields.company, args.company);
    set_if_some(&mut fields.notes, args.notes);
    let outcome = d.submit_client_form().await;
    finish(ctx, &mut d, outcome)
}

async fn cmd_client_show(ctx: &Context, args: IdArg) -> CliResult {
    let d = connect(ctx, false)?;
    let client = d
        .api()
        .get_client(&args.id)
        .await
        .map_err(|e| api_failure(e, "load client"))?;
    if ctx.json {
        return print_json(&client);
    }
    for line in format_client_detail(&client) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_client_rm(ctx: &Context, args: RmArgs) -> CliResult {
    let mut d = connect(ctx, args.yes)?;
    let outcome = d.delete_client(&args.id).await;
    finish(ctx, &mut d, outcome)
}

// ---------------------------------------------------------------------------
// Board and project commands
// ---------------------------------------------------------------------------

async fn cmd_board(ctx: &Context, args: BoardArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    load_all(&mut d).await?;

    let statuses = args
        .statuses
        .iter()
        .map(|s| parse_status(s))
        .collect::<Result<Vec<_>, _>>()?;
    let filter = d.filter_mut();
    *filter = FilterState::with_statuses(statuses);
    filter.search = args.search.unwrap_or_default().trim().to_string();
    d.set_client_filter(args.client.as_deref().unwrap_or(""));

    let now = Utc::now();
    if let Some(path) = &args.html {
        write_file(path, &d.board_html(now, &Local))?;
    }
    let board = d.board(now, &Local);
    if ctx.json {
        return print_json(&board);
    }
    for line in format_board(&board) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_project_add(ctx: &Context, args: ProjectAddArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    d.project_form.open_create();
    let fields = &mut d.project_form.fields;
    fields.client_id = args.client;
    fields.title = args.title;
    set_if_some(&mut fields.description, args.description);
    set_if_some(&mut fields.status, args.status);
    set_if_some(&mut fields.hourly_rate, args.rate);
    set_if_some(&mut fields.deadline, args.deadline);
    let outcome = d.submit_project_form(&Local).await;
    finish(ctx, &mut d, outcome)
}

async fn cmd_project_edit(ctx: &Context, args: ProjectEditArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    match d.refresh_projects().await {
        Outcome::SessionExpired => return Err("not signed in".into()),
        Outcome::Failed => return Err(PROJECTS_LOAD_FAILED.into()),
        _ => {}
    }
    if !d.edit_project(&args.id, &Local) {
        return Err(format!("project not found: {}", args.id).into());
    }
    let fields = &mut d.project_form.fields;
    set_if_some(&mut fields.client_id, args.client);
    set_if_some(&mut fields.title, args.title);
    set_if_some(&mut fields.description, args.description);
    set_if_some(&mut fields.status, args.status);
    set_if_some(&mut fields.hourly_rate, args.rate);
    set_if_some(&mut fields.deadline, args.deadline);
    let outcome = d.submit_project_form(&Local).await;
    finish(ctx, &mut d, outcome)
}

async fn cmd_project_show(ctx: &Context, args: IdArg) -> CliResult {
    let mut d = connect(ctx, false)?;
    load_all(&mut d).await?;
    let cache = d.cache();
    let project = cache
        .project_by_id(&args.id)
        .ok_or_else(|| format!("project not found: {}", args.id))?;
    let client_name = cache.client_name(&project.client_id);
    if ctx.json {
        return print_json(&ProjectJson {
            project,
            client_name,
        });
    }
    for line in format_project_detail(project, client_name, &Local) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_project_status(ctx: &Context, args: ProjectStatusArgs) -> CliResult {
    let status = parse_status(&args.status)?;
    let mut d = connect(ctx, false)?;
    let outcome = d.change_project_status(&args.id, status).await;
    finish(ctx, &mut d, outcome)
}

async fn cmd_project_rm(ctx: &Context, args: RmArgs) -> CliResult {
    let mut d = connect(ctx, args.yes)?;
    let outcome = d.delete_project(&args.id).await;
    finish(ctx, &mut d, outcome)
}

async fn cmd_render(ctx: &Context, args: RenderArgs) -> CliResult {
    let mut d = connect(ctx, false)?;
    load_all(&mut d).await?;
    let now = Utc::now();
    let clients = args.out.join("clients.html");
    let board = args.out.join("board.html");
    write_file(&clients, &d.client_table_html())?;
    write_file(&board, &d.board_html(now, &Local))?;
    if !ctx.json {
        println!("wrote {}", clients.display());
        println!("wrote {}", board.display());
    }
    Ok(())
}
