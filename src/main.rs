use dish_dash::auth;
use dish_dash::config::Config;
use dish_dash::server;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dish_dash=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut args = std::env::args().skip(1);
    if let Some(command) = args.next() {
        if command == "hash-password" {
            let Some(password) = args.next() else {
                eprintln!("Usage: dish-dash hash-password <password>");
                std::process::exit(2);
            };
            match auth::hash_password(&password) {
                Ok(hash) => println!("{}", hash),
                Err(e) => {
                    eprintln!("{}", e);
                    std::process::exit(1);
                }
            }
            return;
        }
        eprintln!("Unknown command: {}", command);
        std::process::exit(2);
    }

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Starting Dish Dash on {}", config.address());

    let host = config.host.clone();
    let port = config.port;

    let (_state, app) = match server::build_app(config) {
        Ok(built) => built,
        Err(e) => {
            tracing::error!("Failed to initialise application: {}", e);
            std::process::exit(1);
        }
    };

    let (actual_port, handle) = match server::serve(app, &host, port).await {
        Ok(served) => served,
        Err(e) => {
            tracing::error!("Failed to bind {}:{}: {}", host, port, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Listening on http://{}:{}", host, actual_port);

    if let Err(e) = handle.await {
        tracing::error!("Server task failed: {}", e);
    }
}
