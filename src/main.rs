use std::error::Error;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use estate_admin::api::models::{Building, Device, House, Reading, Role, User, UserDraft};
use estate_admin::api::{Resource, ResourceApi, ResourceKind};
use estate_admin::common::AppContext;
use estate_admin::config::{Config, LogFormat};
use estate_admin::controller::{
    ListPhase, ResourceListController, UserFilterField, UserPickerController, UserSelection,
};
use estate_admin::error::AppError;
use estate_admin::services::UNKNOWN_NAME;

type CliResult = Result<(), Box<dyn Error>>;

#[derive(Debug, Parser)]
#[command(name = "estate-admin", version, about = "Administer buildings, houses, devices, readings and users")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Locates a record by the list page it appears on.
#[derive(Debug, clap::Args)]
struct Locate {
    /// Search text of the list the record appears in
    #[arg(long, default_value = "")]
    search: String,
    /// Page of that list
    #[arg(long, default_value_t = 1)]
    page: u64,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Obtain and store an access token
    Login {
        username: String,
        #[arg(long, env = "ESTATE_ADMIN_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Invalidate the stored refresh token and forget both tokens
    Logout,
    /// Show the logged-in user
    Profile,
    /// List one page of a resource
    List {
        kind: ResourceKind,
        #[command(flatten)]
        locate: Locate,
    },
    /// Show a single record
    Show { kind: ResourceKind, id: i64 },
    /// Edit fields of a record and save it
    Edit {
        kind: ResourceKind,
        id: i64,
        /// `field=value`; values are parsed as JSON, falling back to text
        #[arg(long = "set", value_parser = parse_assignment, required = true)]
        set: Vec<(String, String)>,
        #[command(flatten)]
        locate: Locate,
    },
    /// Choose the user referenced by a field (owner, resident, user) and save
    AssignUser {
        kind: ResourceKind,
        id: i64,
        field: String,
        #[arg(long, default_value = "")]
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        role: Option<Role>,
        /// Which search result to pick
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Create a user from the filter values instead of picking one
        #[arg(long)]
        create: bool,
        #[command(flatten)]
        locate: Locate,
    },
    /// Create a user
    CreateUser {
        username: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
        #[arg(long, default_value = "")]
        email: String,
        #[arg(long)]
        role: Option<Role>,
    },
    /// Block or unblock a user
    SetActive {
        id: i64,
        /// `true` to unblock, `false` to block
        #[arg(action = clap::ArgAction::Set)]
        active: bool,
    },
}

fn parse_assignment(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(field, value)| (field.trim().to_string(), value.to_string()))
        .filter(|(field, _)| !field.is_empty())
        .ok_or_else(|| format!("expected field=value, got '{s}'"))
}

macro_rules! for_kind {
    ($kind:expr, $func:ident($($arg:expr),* $(,)?)) => {
        match $kind {
            ResourceKind::Buildings => $func::<Building>($($arg),*).await,
            ResourceKind::Houses => $func::<House>($($arg),*).await,
            ResourceKind::Devices => $func::<Device>($($arg),*).await,
            ResourceKind::Readings => $func::<Reading>($($arg),*).await,
            ResourceKind::Users => $func::<User>($($arg),*).await,
        }
    };
}

#[tokio::main]
async fn main() -> CliResult {
    let cli = Cli::parse();

    // Load configuration (fail-fast after logging is up)
    let config = Config::from_env();
    let log_format = config.as_ref().map_or(LogFormat::Pretty, |c| c.log_format);
    init_tracing(log_format);
    let config = config?;

    tracing::debug!(
        deployment = ?config.deployment,
        api = %config.api_base_url,
        "Configuration loaded"
    );

    let ctx = AppContext::new(config)?;

    match cli.command {
        Command::Login { username, password } => {
            ctx.auth().login(&username, &password).await?;
            println!("Logged in as {username}");
        }
        Command::Logout => {
            ctx.auth().logout().await?;
            println!("Logged out");
        }
        Command::Profile => {
            let user = ctx.auth().profile().await?;
            print_record(&ctx, &user).await;
        }
        Command::List { kind, locate } => for_kind!(kind, list(&ctx, &locate))?,
        Command::Show { kind, id } => for_kind!(kind, show(&ctx, id))?,
        Command::Edit {
            kind,
            id,
            set,
            locate,
        } => for_kind!(kind, edit(&ctx, id, &set, &locate))?,
        Command::AssignUser {
            kind,
            id,
            field,
            username,
            first_name,
            last_name,
            email,
            role,
            index,
            create,
            locate,
        } => {
            let draft = UserDraft {
                username,
                role,
                first_name,
                last_name,
                email,
            };
            let pick = PickArgs {
                field,
                draft,
                index,
                create,
            };
            for_kind!(kind, assign_user(&ctx, id, &pick, &locate))?;
        }
        Command::CreateUser {
            username,
            first_name,
            last_name,
            email,
            role,
        } => {
            let draft = UserDraft {
                username,
                role,
                first_name,
                last_name,
                email,
            };
            let user = ctx.users.create(&draft).await?;
            print_record(&ctx, &user).await;
        }
        Command::SetActive { id, active } => {
            let user = ctx
                .users
                .patch(id, &json!({ "is_active": active }))
                .await?;
            ctx.directory.invalidate(id).await;
            print_record(&ctx, &user).await;
        }
    }

    Ok(())
}

fn init_tracing(format: LogFormat) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "warn,estate_admin=info".into());
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Bring the controller to the page holding the record to edit.
async fn open_list<T: Resource>(
    ctx: &AppContext,
    locate: &Locate,
) -> Result<ResourceListController<T, estate_admin::api::ResourceClient<T>>, Box<dyn Error>> {
    let mut controller = ResourceListController::new(ctx.client::<T>());
    controller.mount().await;
    if !locate.search.is_empty() {
        controller.set_search_query(locate.search.clone()).await;
    }
    if locate.page > 1 && !controller.set_page(locate.page).await {
        tracing::warn!(
            page = locate.page,
            total_pages = controller.total_pages(),
            "Page out of range, staying on page {}",
            controller.page()
        );
    }
    check_phase(controller.phase())?;
    Ok(controller)
}

fn check_phase(phase: &ListPhase) -> Result<(), Box<dyn Error>> {
    match phase {
        ListPhase::Error(state) => Err(state.clone().into()),
        ListPhase::LoginRequired => Err(AppError::LoginRequired.into()),
        _ => Ok(()),
    }
}

async fn list<T: Resource>(ctx: &AppContext, at: &Locate) -> CliResult {
    let controller = open_list::<T>(ctx, at).await?;

    println!(
        "{} page {}/{} ({} total)",
        T::KIND,
        controller.page(),
        controller.total_pages(),
        controller.total_count()
    );
    for item in controller.items() {
        println!("{}", row(ctx, item).await);
    }
    Ok(())
}

async fn show<T: Resource>(ctx: &AppContext, id: i64) -> CliResult {
    ctx.session.require_auth_or_redirect()?;
    let record = ctx.client::<T>().get(id).await?;
    print_record(ctx, &record).await;
    Ok(())
}

/// Select `id` on the located page, or fetch it when it is on another page.
async fn open_record<T: Resource>(
    controller: &mut ResourceListController<T, estate_admin::api::ResourceClient<T>>,
    id: i64,
) -> Result<(), AppError> {
    if !controller.select_id(id) {
        let record = controller.api().get(id).await?;
        controller.select(&record);
    }
    Ok(())
}

async fn edit<T: Resource>(
    ctx: &AppContext,
    id: i64,
    assignments: &[(String, String)],
    at: &Locate,
) -> CliResult {
    let mut controller = open_list::<T>(ctx, at).await?;
    open_record(&mut controller, id).await?;

    for (field, raw) in assignments {
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.clone()));
        let typed = controller.edit_field(field, value.clone());
        if typed.is_err() && !value.is_string() {
            controller.edit_field(field, Value::String(raw.clone()))?;
        } else {
            typed?;
        }
    }

    save(ctx, &mut controller).await
}

struct PickArgs {
    field: String,
    draft: UserDraft,
    index: usize,
    create: bool,
}

async fn assign_user<T: Resource>(
    ctx: &AppContext,
    id: i64,
    pick: &PickArgs,
    at: &Locate,
) -> CliResult {
    let mut controller = open_list::<T>(ctx, at).await?;
    open_record(&mut controller, id).await?;

    let label = match controller.selected() {
        Some(buffer) => ctx
            .directory
            .labels_for(&buffer.record)
            .await
            .get(pick.field.as_str())
            .cloned(),
        None => None,
    };

    let mut chosen: Option<UserSelection> = None;
    {
        let mut picker =
            UserPickerController::new((*ctx.users).clone(), label, |selection| chosen = Some(selection));
        picker.open().await;
        tracing::info!(current = picker.label(), field = %pick.field, "Choosing user");

        if pick.create {
            if !picker.create_and_select(&pick.draft).await {
                return Err(error_of(picker.error()).into());
            }
        } else {
            let role = pick.draft.role.map(|r| r.code().to_string()).unwrap_or_default();
            picker.update_filter(UserFilterField::Username, pick.draft.username.clone());
            picker.update_filter(UserFilterField::FirstName, pick.draft.first_name.clone());
            picker.update_filter(UserFilterField::LastName, pick.draft.last_name.clone());
            picker.update_filter(UserFilterField::Email, pick.draft.email.clone());
            picker.update_filter(UserFilterField::Role, role);
            picker.search().await;

            if let Some(state) = picker.error() {
                return Err(error_of(Some(state)).into());
            }
            for (n, user) in picker.results().iter().enumerate() {
                println!("{n}: {}", user_row(user));
            }
            let Some(user) = picker.results().get(pick.index).cloned() else {
                return Err(format!("no user at index {}", pick.index).into());
            };
            picker.pick(user);
        }
    }

    let Some(selection) = chosen else {
        return Err("no user selected".into());
    };
    ctx.directory.remember(&selection.user).await;
    controller.merge_user(&pick.field, &selection)?;
    save(ctx, &mut controller).await
}

fn error_of(state: Option<&estate_admin::error::ErrorState>) -> String {
    state.map_or_else(|| "unknown error".to_string(), ToString::to_string)
}

async fn save<T: Resource>(
    ctx: &AppContext,
    controller: &mut ResourceListController<T, estate_admin::api::ResourceClient<T>>,
) -> CliResult {
    let record = controller.selected().map(|buffer| buffer.record.clone());
    if controller.save().await {
        if let Some(record) = record {
            print_record(ctx, &record).await;
        }
        return Ok(());
    }
    check_phase(controller.phase())?;
    Err("nothing to save".into())
}

async fn row<T: Resource>(ctx: &AppContext, record: &T) -> String {
    let mut cells = vec![format!("#{}", record.id())];
    cells.extend(
        record
            .columns()
            .into_iter()
            .map(|(header, value)| format!("{header}: {value}")),
    );
    for (field, name) in ctx.directory.labels_for(record).await {
        cells.push(format!("{field}: {name}"));
    }
    cells.join(" | ")
}

fn user_row(user: &User) -> String {
    format!(
        "#{} {} ({}) <{}> {}",
        user.id,
        user.username,
        user.display_name(),
        user.email,
        user.role
    )
}

async fn print_record<T: Resource>(ctx: &AppContext, record: &T) {
    println!("{} #{}", T::KIND.singular(), record.id());
    for (header, value) in record.columns() {
        println!("  {header}: {value}");
    }
    for (field, name) in ctx.directory.labels_for(record).await {
        if name != UNKNOWN_NAME {
            println!("  {field}: {name}");
        }
    }
}
