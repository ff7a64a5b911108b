use std::sync::Arc;

use anyhow::{Context, Result};
use lectern_config::{Config, ConfigLoad, ConfigLoader, ConfigLoaderOptions};
use lectern_core::{
    RequestContext,
    auth::TokenService,
    database::{
        Repositories, infrastructure::postgres::PostgresDatabase,
    },
    domain::{Credentials, Services},
    model::{CourseFilter, Page, PageRequest},
};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{
    Cli, Command, ConfigAction, CourseAction, PageArgs, UserAction,
    VideoAction,
};

pub async fn run(cli: Cli) -> Result<()> {
    let load = load_config(&cli)?;

    match cli.command {
        Command::Config {
            action: ConfigAction::Check,
        } => {
            print_config(&load.config);
            Ok(())
        }
        Command::Migrate => {
            let db = connect(&load.config).await?;
            db.migrate().await.context("running migrations")?;
            let stats = db.pool_stats();
            info!(pool_size = stats.size, "migrations applied");
            Ok(())
        }
        Command::User {
            action:
                UserAction::Register {
                    username,
                    password,
                    role,
                },
        } => {
            let services = services(&load.config).await?;
            let user = services
                .auth
                .register(
                    &RequestContext::anonymous(),
                    &Credentials::new(username, password).with_role(role),
                )
                .await
                .context("registering user")?;
            println!("{}\t{}\t{}", user.id, user.username, user.role);
            Ok(())
        }
        Command::Course {
            action:
                CourseAction::List {
                    search,
                    status,
                    page,
                    json,
                },
        } => {
            let services = services(&load.config).await?;
            let filter = CourseFilter { search, status };
            let courses = services
                .courses
                .list(&filter, page_request(page)?)
                .await
                .context("listing courses")?;
            print_page(&courses, json, |course| {
                format!(
                    "{}\t{}\t{}",
                    course.id,
                    course.audit.created_at.to_rfc3339(),
                    course.title
                )
            })
        }
        Command::Video {
            action: VideoAction::List { course, page, json },
        } => {
            let services = services(&load.config).await?;
            let videos = services
                .videos
                .list_by_course(course, page_request(page)?)
                .await
                .context("listing videos")?;
            print_page(&videos, json, |video| {
                format!("{}\t{}\t{}", video.order, video.id, video.title)
            })
        }
        Command::Video {
            action:
                VideoAction::Reorder {
                    video,
                    order,
                    token,
                },
        } => {
            let services = services(&load.config).await?;
            let ctx = services
                .auth
                .authenticate(&token)
                .context("authenticating token")?;
            let moved = services
                .videos
                .reorder(&ctx, video, order)
                .await
                .with_context(|| format!("moving video {video} to {order}"))?;
            println!("{}\t{}\t{}", moved.order, moved.id, moved.title);
            Ok(())
        }
    }
}

fn load_config(cli: &Cli) -> Result<ConfigLoad> {
    let loader = ConfigLoader::with_options(ConfigLoaderOptions {
        config_path: cli.config.clone(),
        env_file: cli.env_file.clone(),
        env: None,
    });
    let load = loader.load().context("loading configuration")?;
    for warning in load.warnings.iter() {
        match &warning.hint {
            Some(hint) => warn!(hint = %hint, "{}", warning.message),
            None => warn!("{}", warning.message),
        }
    }
    Ok(load)
}

async fn connect(config: &Config) -> Result<PostgresDatabase> {
    let url = config
        .database
        .url
        .as_deref()
        .context("DATABASE_URL is required for this command")?;
    let audit = config.reporting.interceptor()?;
    let db =
        PostgresDatabase::connect(url, &config.database.pool_settings(), audit)
            .await
            .context("connecting to PostgreSQL")?;
    Ok(db)
}

async fn services(config: &Config) -> Result<Services> {
    let db = connect(config).await?;
    let repos = Repositories::postgres(&db);
    let crypto = config
        .auth
        .password_crypto()
        .context("configuring password hashing")?;
    let tokens = TokenService::new(&config.auth.token_settings())
        .context("configuring token signing")?;
    Ok(Services::new(&repos, Arc::new(crypto), tokens))
}

fn page_request(args: PageArgs) -> Result<PageRequest> {
    Ok(PageRequest::new(args.page, args.limit)?)
}

fn print_page<T: Serialize>(
    page: &Page<T>,
    json: bool,
    line: impl Fn(&T) -> String,
) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(page)?);
        return Ok(());
    }
    for item in &page.items {
        println!("{}", line(item));
    }
    println!(
        "page {}/{} ({} total)",
        page.page, page.total_pages, page.total
    );
    Ok(())
}

fn print_config(config: &Config) {
    let path = config
        .metadata
        .config_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<none>".into());
    println!("config file:        {path}");
    println!("env file loaded:    {}", config.metadata.env_file_loaded);
    println!(
        "database url:       {}",
        if config.database.url.is_some() { "set" } else { "unset" }
    );
    println!("max connections:    {}", config.database.max_connections);
    println!("acquire timeout:    {:?}", config.database.acquire_timeout);
    println!("access token ttl:   {:?}", config.auth.access_ttl);
    println!("refresh token ttl:  {:?}", config.auth.refresh_ttl);
    println!(
        "reporting offset:   UTC{:+}",
        config.reporting.utc_offset_hours
    );
}
