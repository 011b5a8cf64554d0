//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};

use rollcall_core::models::{Role, UserFilter};

#[derive(Debug, Parser)]
#[command(name = "rollcall", version, about = "Console for the school user-management service")]
pub struct Cli {
    /// API base URL (overrides ROLLCALL_API_BASE_URL and the config file)
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Also write logs to daily-rotated files in this directory
    #[arg(long, global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Sign in with a local login ID (teachers and administrators)
    Login {
        /// Login ID; defaults to the last one used
        #[arg(long)]
        id: Option<String>,
    },
    /// Print the URL that starts Google sign-in
    LoginGoogle,
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user's profile
    Me {
        /// Print the raw profile as JSON
        #[arg(long)]
        json: bool,
    },
    /// Report whether a usable session is held
    Status,
    /// Administrator user management
    #[command(subcommand)]
    Users(UsersCommand),
}

#[derive(Debug, Subcommand)]
pub enum UsersCommand {
    /// List users, one page at a time
    List {
        #[command(flatten)]
        filter: FilterArgs,
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Print the raw page as JSON
        #[arg(long)]
        json: bool,
    },
    /// Register a user who signs in with Google
    Create(CreateArgs),
    /// Register a teacher or administrator with a local login ID
    CreateLocal(CreateLocalArgs),
    /// Soft-delete a user
    Delete {
        id: i64,
        /// Skip the confirmation prompt
        #[arg(long, short)]
        yes: bool,
    },
    /// Preview a CSV import, and run it with --commit
    Import {
        file: PathBuf,
        #[arg(long)]
        commit: bool,
    },
    /// Preview a CSV bulk deletion, and run it with --commit
    BulkDelete {
        file: PathBuf,
        #[arg(long)]
        commit: bool,
    },
    /// Download users (or the empty import template) as CSV
    Export {
        /// Download the import template instead of user data
        #[arg(long)]
        template: bool,
        /// Output path; defaults to users.csv or users_template.csv
        #[arg(long, short)]
        output: Option<PathBuf>,
        #[command(flatten)]
        filter: FilterArgs,
    },
}

#[derive(Debug, Clone, Args)]
pub struct FilterArgs {
    #[arg(long)]
    pub role: Option<Role>,
    #[arg(long)]
    pub grade: Option<i32>,
    #[arg(long = "class")]
    pub class_name: Option<String>,
    /// Match against name, email or school ID
    #[arg(long)]
    pub keyword: Option<String>,
    /// Include soft-deleted users
    #[arg(long)]
    pub include_deleted: bool,
}

impl From<FilterArgs> for UserFilter {
    fn from(args: FilterArgs) -> Self {
        UserFilter {
            role: args.role,
            grade: args.grade,
            class_name: args.class_name,
            keyword: args.keyword,
            include_deleted: args.include_deleted,
        }
    }
}

#[derive(Debug, Clone, Args)]
pub struct CreateArgs {
    #[arg(long)]
    pub role: Role,
    /// Full name
    #[arg(long)]
    pub name: String,
    /// Phonetic (kana) reading of the name
    #[arg(long)]
    pub kana: Option<String>,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "unknown")]
    pub gender: String,
    /// School-assigned identifier
    #[arg(long)]
    pub school_id: Option<String>,
    /// Date of birth (YYYY-MM-DD)
    #[arg(long)]
    pub birth_date: Option<NaiveDate>,
    /// Grade (students only)
    #[arg(long)]
    pub grade: Option<i32>,
    /// Class (students only)
    #[arg(long = "class")]
    pub class_name: Option<String>,
}

#[derive(Debug, Clone, Args)]
pub struct CreateLocalArgs {
    #[arg(long, default_value = "teacher")]
    pub role: Role,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub kana: Option<String>,
    #[arg(long)]
    pub email: String,
    #[arg(long, default_value = "unknown")]
    pub gender: String,
    #[arg(long)]
    pub school_id: Option<String>,
    #[arg(long)]
    pub birth_date: Option<NaiveDate>,
    /// Login ID for the new account; the password is prompted for
    #[arg(long)]
    pub login_id: String,
}
