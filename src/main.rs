use anyhow::Result;
use dotenvy::dotenv;
use std::sync::Arc;
use std::time::Duration;
use teloxide::prelude::*;
use tokio::time::sleep;

use mebelbot::cli::{Cli, Commands};
use mebelbot::core::{config, logging::init_logger};
use mebelbot::storage::contact_log::ContactLog;
use mebelbot::storage::products::{Product, ProductStore};
use mebelbot::storage::{create_pool, get_connection, migrations};
use mebelbot::telegram::{create_bot, schema, setup_bot_commands, HandlerDeps};
use mebelbot::web::start_web_server;

/// Maximum number of dispatcher reconnect attempts
const MAX_DISPATCHER_RETRIES: u32 = 5;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let cli = Cli::parse_args();

    // Global panic handler so dispatcher panics get logged instead of
    // silently terminating the task
    std::panic::set_hook(Box::new(|panic_info| {
        log::error!("Panic caught: {:?}", panic_info);
        if let Some(location) = panic_info.location() {
            log::error!("Panic at {}:{}:{}", location.file(), location.line(), location.column());
        }
    }));

    // Load environment variables from .env if present
    let _ = dotenv();

    // Initialize logger (console + file)
    init_logger(&config::LOG_FILE_PATH)?;

    match cli.command {
        Some(Commands::Run { webhook }) => {
            log::info!("Running bot and website (webhook: {})", webhook);
            run(webhook).await
        }
        Some(Commands::Serve) => {
            log::info!("Running website only");
            run_web_only().await
        }
        Some(Commands::SeedProducts { force }) => seed_products(force),
        None => {
            log::info!("No command specified, running in default mode");
            run(false).await
        }
    }
}

/// Run the bot dispatcher alongside the website.
async fn run(use_webhook: bool) -> Result<()> {
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );

    // Migrations run on a plain connection outside the pool
    {
        let mut conn = rusqlite::Connection::open(config::DATABASE_PATH.as_str())?;
        migrations::run_migrations(&mut conn)?;
    }
    log::info!("Database ready at {}", config::DATABASE_PATH.as_str());

    if config::BOT_TOKEN.is_empty() {
        return Err(anyhow::anyhow!("BOT_TOKEN environment variable not set"));
    }
    // teloxide reads TELOXIDE_TOKEN; mirror BOT_TOKEN when only that is set
    if std::env::var("TELOXIDE_TOKEN").is_err() {
        std::env::set_var("TELOXIDE_TOKEN", config::BOT_TOKEN.as_str());
    }

    let bot = create_bot()?;
    if let Err(e) = setup_bot_commands(&bot).await {
        log::warn!("Failed to set bot commands: {}", e);
    }

    let products = ProductStore::new(&config::PRODUCTS_FILE);
    let contact_log = ContactLog::new(&config::MESSAGES_FILE);

    let web_db = Arc::clone(&db_pool);
    let web_products = products.clone();
    let web_log = contact_log.clone();
    let web_bot = bot.clone();
    let port = *config::web::WEB_PORT;
    tokio::spawn(async move {
        if let Err(e) = start_web_server(port, web_db, web_products, web_log, web_bot).await {
            log::error!("Web server failed: {}", e);
        }
    });

    if config::admin::ADMIN_IDS.is_empty() {
        log::warn!("ADMIN_IDS is empty, new tickets will not be announced to anyone");
    }

    let deps = HandlerDeps::new(Arc::clone(&db_pool), products, contact_log);
    let handler = schema(deps);

    let webhook_url = if use_webhook { config::WEBHOOK_URL.clone() } else { None };

    if let Some(url) = webhook_url {
        run_webhook(bot, handler, &url).await
    } else {
        run_polling(bot, handler).await
    }
}

/// Webhook mode: Telegram posts update envelopes, we answer an empty 200.
async fn run_webhook(
    bot: Bot,
    handler: teloxide::dispatching::UpdateHandler<mebelbot::telegram::HandlerError>,
    url: &str,
) -> Result<()> {
    use teloxide::update_listeners::webhooks;

    log::info!("Starting bot in webhook mode at {}", url);

    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], *config::web::WEBHOOK_PORT));
    let options = webhooks::Options::new(addr, url::Url::parse(url)?);
    let listener = webhooks::axum(bot.clone(), options)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to set up webhook listener: {}", e))?;

    Dispatcher::builder(bot, handler)
        .dependencies(DependencyMap::new())
        .enable_ctrlc_handler()
        .build()
        .dispatch_with_listener(
            listener,
            LoggingErrorHandler::with_custom_text("An error from the update listener"),
        )
        .await;

    Ok(())
}

/// Long polling mode (default), with reconnect on dispatcher panics.
async fn run_polling(
    bot: Bot,
    handler: teloxide::dispatching::UpdateHandler<mebelbot::telegram::HandlerError>,
) -> Result<()> {
    log::info!("Starting bot in long polling mode");

    let mut retry_count: u32 = 0;
    loop {
        let bot_clone = bot.clone();
        let handler_clone = handler.clone();

        // Run the dispatcher in a separate task to isolate panics
        let handle = tokio::spawn(async move {
            use teloxide::update_listeners::Polling;

            // Drop pending updates on start
            let listener = Polling::builder(bot_clone.clone()).drop_pending_updates().build();

            Dispatcher::builder(bot_clone, handler_clone)
                .dependencies(DependencyMap::new())
                .enable_ctrlc_handler()
                .build()
                .dispatch_with_listener(
                    listener,
                    LoggingErrorHandler::with_custom_text("An error from the update listener"),
                )
                .await
        });

        match handle.await {
            Ok(()) => {
                log::info!("Dispatcher shutdown gracefully");
                break;
            }
            Err(join_err) => {
                if join_err.is_panic() {
                    log::error!("Dispatcher panicked: {}", join_err);
                    if retry_count < MAX_DISPATCHER_RETRIES {
                        retry_count += 1;
                        log::info!(
                            "Retrying dispatcher connection (attempt {}/{})...",
                            retry_count,
                            MAX_DISPATCHER_RETRIES
                        );
                        sleep(Duration::from_secs(2u64.saturating_pow(retry_count))).await;
                    } else {
                        log::error!("Max retries reached. Exiting...");
                        break;
                    }
                } else {
                    log::warn!("Dispatcher task was cancelled: {}", join_err);
                    break;
                }
            }
        }
    }

    Ok(())
}

/// Website without the bot dispatcher. The contact fan-out still needs a
/// token; pages work without one being valid.
async fn run_web_only() -> Result<()> {
    let db_pool = Arc::new(
        create_pool(&config::DATABASE_PATH).map_err(|e| anyhow::anyhow!("Failed to create database pool: {}", e))?,
    );
    {
        let mut conn = rusqlite::Connection::open(config::DATABASE_PATH.as_str())?;
        migrations::run_migrations(&mut conn)?;
    }

    // Smoke-check the pool before serving
    let _ = get_connection(&db_pool).map_err(|e| anyhow::anyhow!("Database pool unavailable: {}", e))?;

    if std::env::var("TELOXIDE_TOKEN").is_err() {
        std::env::set_var("TELOXIDE_TOKEN", config::BOT_TOKEN.as_str());
    }
    let bot = create_bot()?;

    let products = ProductStore::new(&config::PRODUCTS_FILE);
    let contact_log = ContactLog::new(&config::MESSAGES_FILE);

    start_web_server(*config::web::WEB_PORT, db_pool, products, contact_log, bot)
        .await
        .map_err(|e| anyhow::anyhow!("Web server failed: {}", e))
}

/// Write a small demo catalog into the products file.
fn seed_products(force: bool) -> Result<()> {
    let store = ProductStore::new(&config::PRODUCTS_FILE);
    if !store.load().is_empty() && !force {
        return Err(anyhow::anyhow!(
            "Products file {} is not empty, use --force to overwrite",
            config::PRODUCTS_FILE.as_str()
        ));
    }

    let mut divan = Product::new("Divan Premium", "divan", 4_500_000);
    divan.description = "Uch o'rinli yumshoq divan, yotoq rejimiga o'tadi.".to_string();
    divan.material = "Eko-teri, yog'och karkas".to_string();
    divan.warranty = "2 yil".to_string();
    divan.discount = 10;

    let mut shkaf = Product::new("Shkaf Klassik", "shkaf", 2_800_000);
    shkaf.description = "Uch eshikli kiyim shkafi, oynali.".to_string();
    shkaf.material = "MDF".to_string();
    shkaf.warranty = "1 yil".to_string();

    let mut stol = Product::new("Oshxona stoli", "stol", 1_200_000);
    stol.description = "Olti kishilik oshxona stoli.".to_string();
    stol.material = "Yog'och".to_string();

    store.save(&[divan, shkaf, stol])?;
    log::info!("Seeded demo catalog into {}", config::PRODUCTS_FILE.as_str());
    Ok(())
}
