use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::info;
use userdesk_config::{load as load_config, AppConfig};
use userdesk_database::{OperationLogRepository, RoleRepository};
use userdesk_gateway::{create_router, GatewayState};
use userdesk_runtime::{telemetry, BackendServices};
use userdesk_users::{ApiResponse, NewUser, UserRef, UserService};

const ADMIN_ROLE: &str = "admin";

#[derive(Parser)]
#[command(name = "userdesk")]
#[command(about = "User management service (serves HTTP by default)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP server
    Serve,
    /// Create a user holding the admin role and print a session token for it
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Check a username and password and print a session token
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Issue a bearer token for an existing user
    IssueToken {
        #[arg(long)]
        user_id: i64,
    },
    /// Invalidate a bearer token
    RevokeToken {
        #[arg(long)]
        token: String,
    },
    /// List the roles that can be assigned to users
    Roles,
    /// Print the most recent audited operations
    AuditLog {
        #[arg(long, default_value_t = 20)]
        limit: i64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    telemetry::init_tracing().context("failed to initialise tracing")?;
    let config = load_config().context("failed to load configuration")?;
    let services = BackendServices::initialise(&config)
        .await
        .context("failed to initialise backend services")?;

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(&config, services).await,
        Commands::CreateAdmin {
            username,
            password,
            email,
        } => create_admin(&config, &services, username, password, email).await,
        Commands::Login { username, password } => login(&services, &username, &password).await,
        Commands::IssueToken { user_id } => issue_token(&services, user_id).await,
        Commands::RevokeToken { token } => revoke_token(&services, &token).await,
        Commands::Roles => list_roles(&services).await,
        Commands::AuditLog { limit } => audit_log(&services, limit).await,
    }
}

async fn run_server(config: &AppConfig, services: BackendServices) -> anyhow::Result<()> {
    info!("starting userdesk");

    let state = GatewayState::new(services.db_pool.clone(), services.authenticator.clone(), config);
    let app = create_router(state);

    let address = format!("{}:{}", config.http.address, config.http.port);
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind http listener on {address}"))?;

    info!(%address, "http server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(userdesk_runtime::shutdown_signal())
        .await
        .context("http server error")?;

    info!("userdesk shut down");
    Ok(())
}

async fn create_admin(
    config: &AppConfig,
    services: &BackendServices,
    username: String,
    password: String,
    email: Option<String>,
) -> anyhow::Result<()> {
    let admin_role = RoleRepository::new(services.db_pool.clone())
        .find_id_by_name(ADMIN_ROLE)
        .await
        .context("failed to look up admin role")?
        .with_context(|| format!("role `{ADMIN_ROLE}` is missing; were migrations applied?"))?;

    let users = UserService::new(services.db_pool.clone(), config.pagination.clone());

    let user = into_data(
        users
            .insert(NewUser {
                username,
                password: Some(password),
                email,
                ..NewUser::default()
            })
            .await,
    )
    .context("failed to create admin user")?;

    if let Err(error) = into_data(users.update_role(user.id, vec![admin_role]).await) {
        // Leave no half-created admin behind.
        users.delete(UserRef::from(user.id)).await;
        return Err(error.context("failed to assign admin role"));
    }

    let session = services
        .authenticator
        .issue_session(user.id)
        .await
        .context("failed to issue session")?;

    info!(user_id = user.id, username = %user.username, "admin user created");
    println!("user id:    {}", user.id);
    println!("token:      {}", session.token);
    println!("expires at: {}", session.expires_at.to_rfc3339());
    Ok(())
}

async fn login(services: &BackendServices, username: &str, password: &str) -> anyhow::Result<()> {
    let session = services
        .authenticator
        .login_with_password(username, password)
        .await
        .with_context(|| format!("login failed for {username}"))?;

    println!("user id:    {}", session.user_id);
    println!("token:      {}", session.token);
    println!("expires at: {}", session.expires_at.to_rfc3339());
    Ok(())
}

async fn issue_token(services: &BackendServices, user_id: i64) -> anyhow::Result<()> {
    let session = services
        .authenticator
        .issue_session(user_id)
        .await
        .with_context(|| format!("failed to issue session for user {user_id}"))?;

    println!("token:      {}", session.token);
    println!("expires at: {}", session.expires_at.to_rfc3339());
    Ok(())
}

async fn revoke_token(services: &BackendServices, token: &str) -> anyhow::Result<()> {
    let revoked = services
        .authenticator
        .revoke(token)
        .await
        .context("failed to revoke session")?;

    if !revoked {
        bail!("no session matches the given token");
    }
    println!("session revoked");
    Ok(())
}

async fn list_roles(services: &BackendServices) -> anyhow::Result<()> {
    let roles = RoleRepository::new(services.db_pool.clone())
        .list_all()
        .await
        .context("failed to fetch roles")?;

    println!("{:<4} {:<12} {}", "ID", "Name", "Description");
    println!("{}", "-".repeat(48));
    for role in roles {
        println!(
            "{:<4} {:<12} {}",
            role.id,
            role.name,
            role.description.as_deref().unwrap_or("")
        );
    }
    Ok(())
}

async fn audit_log(services: &BackendServices, limit: i64) -> anyhow::Result<()> {
    let entries = OperationLogRepository::new(services.db_pool.clone())
        .recent(limit.max(1))
        .await
        .context("failed to fetch operation log")?;

    if entries.is_empty() {
        println!("No operations recorded");
        return Ok(());
    }

    println!(
        "{:<6} {:<26} {:<20} {:<8} {:<7} {:<24} {:<8} {:<8}",
        "ID", "At", "Operation", "Actor", "Method", "Path", "Status", "Ms"
    );
    println!("{}", "-".repeat(112));

    for entry in entries {
        println!(
            "{:<6} {:<26} {:<20} {:<8} {:<7} {:<24} {:<8} {:<8}",
            entry.id,
            entry.created_at,
            entry.operation,
            entry
                .actor_id
                .map(|id| id.to_string())
                .unwrap_or_else(|| "-".to_string()),
            entry.method,
            entry.path,
            entry.status,
            entry.duration_ms,
        );
    }

    Ok(())
}

/// Unwrap a service envelope, turning failures into errors.
fn into_data<T>(response: ApiResponse<T>) -> anyhow::Result<T> {
    match response.data {
        Some(data) if response.is_success() => Ok(data),
        _ => bail!("{} ({})", response.message, response.code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;
    use userdesk_users::ResultCode;

    #[test]
    fn serve_is_the_default_command() {
        let cli = Cli::try_parse_from(["userdesk"]).unwrap();
        assert!(cli.command.is_none());
    }

    #[test]
    fn create_admin_arguments_parse() {
        let cli = Cli::try_parse_from([
            "userdesk",
            "create-admin",
            "--username",
            "root",
            "--password",
            "changeme",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::CreateAdmin {
                username,
                password,
                email,
            }) => {
                assert_eq!(username, "root");
                assert_eq!(password, "changeme");
                assert!(email.is_none());
            }
            _ => panic!("expected create-admin"),
        }
    }

    #[test]
    fn audit_log_limit_defaults() {
        let cli = Cli::try_parse_from(["userdesk", "audit-log"]).unwrap();
        assert!(matches!(cli.command, Some(Commands::AuditLog { limit: 20 })));
    }

    async fn test_services() -> (AppConfig, BackendServices, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let mut config = AppConfig::default();
        config.database.url = format!("sqlite://{}", temp_dir.path().join("cli.db").display());
        let services = BackendServices::initialise(&config).await.unwrap();
        (config, services, temp_dir)
    }

    async fn user_count(services: &BackendServices) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&services.db_pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn create_admin_assigns_admin_role() {
        let (config, services, _temp_dir) = test_services().await;

        create_admin(&config, &services, "root".into(), "changeme".into(), None)
            .await
            .unwrap();

        let session = services
            .authenticator
            .login_with_password("root", "changeme")
            .await
            .unwrap();
        let users = UserService::new(services.db_pool.clone(), config.pagination.clone());
        let detail = users.get_by_id(session.user_id).await.data.unwrap();
        assert_eq!(detail.role_ids, vec![1]);
    }

    #[tokio::test]
    async fn create_admin_without_admin_role_creates_nothing() {
        let (config, services, _temp_dir) = test_services().await;
        sqlx::query("DELETE FROM roles WHERE name = 'admin'")
            .execute(&services.db_pool)
            .await
            .unwrap();

        let result = create_admin(&config, &services, "root".into(), "changeme".into(), None).await;

        assert!(result.is_err());
        assert_eq!(user_count(&services).await, 0);
    }

    #[tokio::test]
    async fn revoke_token_rejects_unknown_tokens() {
        let (_config, services, _temp_dir) = test_services().await;
        assert!(revoke_token(&services, "missing").await.is_err());
    }

    #[test]
    fn into_data_surfaces_failures() {
        assert_eq!(into_data(ApiResponse::success(7)).unwrap(), 7);

        let error = into_data::<i64>(ApiResponse::failure(ResultCode::Conflict, "username already exists"))
            .unwrap_err();
        assert!(error.to_string().contains("username already exists"));
    }
}
