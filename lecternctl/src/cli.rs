use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use lectern_core::model::{CourseID, Role, VideoID};

#[derive(Debug, Parser)]
#[command(
    name = "lecternctl",
    version,
    about = "Lectern operator CLI: configuration, schema and content upkeep"
)]
pub struct Cli {
    /// TOML configuration file (defaults to lectern.toml when present)
    #[arg(long, global = true, env = "LECTERN_CONFIG")]
    pub config: Option<PathBuf>,
    /// Dotenv file loaded before reading the environment
    #[arg(long, global = true)]
    pub env_file: Option<PathBuf>,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Inspect the resolved configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Apply pending database migrations
    Migrate,
    /// Manage accounts
    User {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Browse courses
    Course {
        #[command(subcommand)]
        action: CourseAction,
    },
    /// Browse and arrange course videos
    Video {
        #[command(subcommand)]
        action: VideoAction,
    },
}

#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Load configuration, print it with secrets redacted, list warnings
    Check,
}

#[derive(Debug, Subcommand)]
pub enum UserAction {
    /// Create an account
    Register {
        #[arg(long)]
        username: String,
        #[arg(long, env = "LECTERN_PASSWORD", hide_env_values = true)]
        password: String,
        /// ADMIN, LECTURER or STUDENT
        #[arg(long, default_value = "STUDENT")]
        role: Role,
    },
}

#[derive(Debug, Subcommand)]
pub enum CourseAction {
    /// List live courses, newest first
    List {
        /// Case-insensitive title filter
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        status: Option<i32>,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum VideoAction {
    /// List the live videos of a course in order
    List {
        #[arg(long)]
        course: CourseID,
        #[command(flatten)]
        page: PageArgs,
        #[arg(long)]
        json: bool,
    },
    /// Move a video to a new position within its course
    Reorder {
        #[arg(long)]
        video: VideoID,
        /// Zero-based target position
        #[arg(long, allow_negative_numbers = true)]
        order: i64,
        /// Access token of the course author
        #[arg(long, env = "LECTERN_TOKEN", hide_env_values = true)]
        token: String,
    },
}

#[derive(Debug, Clone, Copy, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,
    #[arg(long, default_value_t = 10)]
    pub limit: u32,
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_tree_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn reorder_accepts_negative_orders_for_validation_downstream() {
        let cli = Cli::try_parse_from([
            "lecternctl",
            "video",
            "reorder",
            "--video",
            "0190a0c4-5f2b-7cc1-8000-000000000001",
            "--order",
            "-1",
            "--token",
            "t",
        ])
        .unwrap();
        match cli.command {
            Command::Video {
                action: VideoAction::Reorder { order, .. },
            } => assert_eq!(order, -1),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn register_parses_role() {
        let cli = Cli::try_parse_from([
            "lecternctl",
            "user",
            "register",
            "--username",
            "ada",
            "--password",
            "pw",
            "--role",
            "lecturer",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Command::User {
                action: UserAction::Register {
                    role: Role::Lecturer,
                    ..
                }
            }
        ));
    }
}
