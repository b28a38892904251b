//! Command-line interface for the center console
//!
//! - `open`: render any public or admin page
//! - `login` / `logout` / `status`: admin session
//! - admin writes: appointments, programs, blog, settings, newsletter
//! - public writes: contact form, booking, newsletter sign-up

use std::path::PathBuf;

use center_api::{AppointmentStatus, ProgramCategory};
use chrono::{NaiveDate, NaiveTime};
use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "center-admin",
    version,
    about = "Psychology center site and admin console",
    propagate_version = true
)]
pub struct Cli {
    /// Configuration file path (defaults to CONFIG_PATH, then center-admin.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log format (text, json)
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Render a page, e.g. `/programs` or `/admin/appointments`
    Open(OpenArgs),

    /// Sign in to the admin panel
    Login(LoginArgs),

    /// Sign out and forget the stored session
    Logout,

    /// Show the current session state
    Status,

    /// Change an appointment's status
    #[command(name = "appointment-status")]
    AppointmentStatus {
        id: String,
        /// pending, confirmed, completed or cancelled
        status: AppointmentStatus,
    },

    /// Create a program from a JSON file
    #[command(name = "create-program")]
    CreateProgram { file: PathBuf },

    /// Create a blog post from a JSON file
    #[command(name = "create-post")]
    CreatePost { file: PathBuf },

    /// Delete a blog post by id
    #[command(name = "delete-post")]
    DeletePost { id: String },

    /// Update site contact settings; omitted fields keep their value
    #[command(name = "update-settings")]
    UpdateSettings(SettingsArgs),

    /// Replace the privacy policy with the contents of an HTML file
    #[command(name = "set-privacy")]
    SetPrivacy { file: PathBuf },

    /// Send an HTML newsletter to every subscriber
    #[command(name = "send-newsletter")]
    SendNewsletter {
        #[arg(long)]
        subject: String,
        file: PathBuf,
    },

    /// Send a message through the public contact form
    Contact(ContactArgs),

    /// Book an appointment
    Book(BookArgs),

    /// Subscribe an address to the newsletter
    Subscribe { email: String },
}

impl Command {
    /// Whether the persisted session is verified before running. Signing out
    /// never needs the backend.
    pub fn restores_session(&self) -> bool {
        !matches!(self, Command::Logout)
    }
}

#[derive(Args, Debug, Clone)]
pub struct OpenArgs {
    /// Page path
    #[arg(default_value = "/")]
    pub path: String,

    /// Blog search over titles and excerpts
    #[arg(long)]
    pub search: Option<String>,

    /// Blog tag
    #[arg(long)]
    pub tag: Option<String>,

    /// Program category (all, children, adults, group, individual)
    #[arg(long, default_value = "all")]
    pub category: ProgramCategory,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub username: String,

    /// Read the password from stdin instead of CENTER_ADMIN_PASSWORD
    #[arg(long)]
    pub password_stdin: bool,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SettingsArgs {
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub work_schedule: Option<String>,
    #[arg(long)]
    pub vk_link: Option<String>,
}

impl SettingsArgs {
    pub fn is_empty(&self) -> bool {
        self.phone.is_none()
            && self.email.is_none()
            && self.address.is_none()
            && self.work_schedule.is_none()
            && self.vk_link.is_none()
    }
}

#[derive(Args, Debug, Clone)]
pub struct ContactArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub subject: String,
    #[arg(long)]
    pub message: String,
}

#[derive(Args, Debug, Clone)]
pub struct BookArgs {
    /// Program id
    #[arg(long)]
    pub program: String,
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub phone: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub child_name: Option<String>,
    #[arg(long)]
    pub child_age: Option<u32>,
    /// Preferred date (YYYY-MM-DD)
    #[arg(long)]
    pub date: NaiveDate,
    /// Preferred time (HH:MM)
    #[arg(long)]
    pub time: NaiveTime,
    #[arg(long)]
    pub message: Option<String>,
}
