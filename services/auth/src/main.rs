use anyhow::Result;
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

use auth::AppState;
use auth::jwt::{JwtConfig, JwtService};
use auth::repositories::UserRepository;
use auth::routes;
use auth::service::AuthService;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    info!("Starting authentication service");

    // Initialize database connection pool
    let db_config = common::database::DatabaseConfig::from_env()?;
    let pool = common::database::init_pool(&db_config).await?;

    // Check database connectivity
    if common::database::health_check(&pool).await? {
        info!("Database connection successful");
    } else {
        anyhow::bail!("Failed to connect to database");
    }

    // Apply pending schema migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Initialize the token codec and the auth service core
    let jwt_config = JwtConfig::from_env()?;
    let jwt_service = JwtService::new(&jwt_config);
    let user_repository = UserRepository::new(pool.clone());
    let auth_service = AuthService::new(user_repository, jwt_service);

    info!("Authentication service initialized successfully");

    let app_state = AppState {
        db_pool: pool,
        auth_service,
    };

    // Start the web server
    let app = routes::create_router(app_state);

    let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
    info!("Authentication service listening on 0.0.0.0:3000");

    axum::serve(listener, app).await?;

    Ok(())
}
