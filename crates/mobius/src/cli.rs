//! Clap derive structures for the `mobius` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// mobius -- command-line console for Mobius MDM
#[derive(Debug, Parser)]
#[command(
    name = "mobius",
    version,
    about = "Manage Mobius MDM devices, policies and apps from the command line",
    long_about = "Administer a Mobius MDM server from the terminal.\n\n\
        Log in once with `mobius login`; the session token is kept in the OS\n\
        keyring (or a token file) and sent with every request until the\n\
        server rejects it.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "MOBIUS_PROFILE", global = true)]
    pub profile: Option<String>,

    /// API base URL, e.g. http://localhost:8081/api/v1 (overrides profile)
    #[arg(long, short = 's', env = "MOBIUS_SERVER", global = true)]
    pub server: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "MOBIUS_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "MOBIUS_INSECURE", global = true)]
    pub insecure: bool,

    /// Request timeout in seconds (default from config, 10)
    #[arg(long, env = "MOBIUS_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session token
    Login(LoginArgs),

    /// Forget the stored session token
    Logout,

    /// Show the active profile and whether a session token is stored
    Status,

    /// Show server health
    Health,

    /// Show or update the server license
    License(LicenseArgs),

    /// Manage enrolled devices
    #[command(alias = "dev", alias = "d")]
    Devices(DevicesArgs),

    /// Manage configuration policies
    #[command(alias = "pol")]
    Policies(PoliciesArgs),

    /// Manage the application catalog
    #[command(alias = "applications")]
    Apps(AppsArgs),

    /// Manage device groups
    #[command(alias = "g")]
    Groups(GroupsArgs),

    /// Stream realtime events from the server
    Watch(WatchArgs),

    /// Manage CLI configuration and profiles
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Auth ─────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Account email (defaults to the profile's email, else prompts)
    #[arg(long, short = 'e')]
    pub email: Option<String>,

    /// Password (prompts when omitted)
    #[arg(long, env = "MOBIUS_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

// ── License ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct LicenseArgs {
    #[command(subcommand)]
    pub command: LicenseCommand,
}

#[derive(Debug, Subcommand)]
pub enum LicenseCommand {
    /// Show tier, enrollment headroom and expiry
    Status,

    /// Install a new license key
    Update {
        /// License key
        key: String,
    },
}

// ── Devices ──────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct DevicesArgs {
    #[command(subcommand)]
    pub command: DevicesCommand,
}

#[derive(Debug, Subcommand)]
pub enum DevicesCommand {
    /// List devices
    #[command(alias = "ls")]
    List(DeviceListArgs),

    /// Show one device
    Get {
        /// Device ID
        device: String,
    },

    /// Enroll a device
    Enroll(DeviceFields),

    /// Update device fields
    Update {
        /// Device ID
        device: String,

        #[command(flatten)]
        fields: DeviceFields,

        /// Status override
        #[arg(long)]
        status: Option<String>,
    },

    /// Unenroll (delete) a device
    #[command(alias = "rm")]
    Remove {
        /// Device ID
        device: String,
    },

    /// Lock a device
    Lock {
        /// Device ID
        device: String,
    },

    /// Unlock a device
    Unlock {
        /// Device ID
        device: String,
    },

    /// Factory-reset a device (irreversible)
    Wipe {
        /// Device ID
        device: String,
    },

    /// Replace the set of policies assigned to a device
    AssignPolicies {
        /// Device ID
        device: String,

        /// Policy IDs
        #[arg(required = true, num_args = 1..)]
        policies: Vec<String>,
    },

    /// Run a command on a device
    Command {
        /// Device ID
        device: String,

        /// Command name, e.g. restart
        command: String,

        /// Parameters as a JSON object
        #[arg(long)]
        params: Option<String>,
    },

    /// Run a read-only osquery SELECT on a device
    Osquery {
        /// Device ID
        device: String,

        /// SQL statement, e.g. "SELECT name, pid FROM processes"
        query: String,
    },
}

#[derive(Debug, Args)]
pub struct DeviceListArgs {
    /// Max results
    #[arg(long, short = 'l')]
    pub limit: Option<u32>,

    /// Pagination offset
    #[arg(long)]
    pub offset: Option<u32>,

    /// Filter by platform (windows, macos, linux, ...)
    #[arg(long)]
    pub platform: Option<String>,

    /// Filter by status (online, offline, pending)
    #[arg(long)]
    pub status: Option<String>,

    /// Free-text search
    #[arg(long)]
    pub search: Option<String>,
}

#[derive(Debug, Args)]
pub struct DeviceFields {
    /// Hardware UUID
    #[arg(long)]
    pub uuid: Option<String>,

    /// Hostname
    #[arg(long)]
    pub hostname: Option<String>,

    /// Platform
    #[arg(long)]
    pub platform: Option<String>,

    /// OS version
    #[arg(long)]
    pub os_version: Option<String>,

    /// Enrolled user
    #[arg(long)]
    pub user: Option<String>,
}

// ── Policies ─────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct PoliciesArgs {
    #[command(subcommand)]
    pub command: PoliciesCommand,
}

#[derive(Debug, Subcommand)]
pub enum PoliciesCommand {
    /// List policies
    #[command(alias = "ls")]
    List,

    /// Show one policy
    Get {
        /// Policy ID
        policy: String,
    },

    /// Create a policy
    Create(PolicyFields),

    /// Update a policy
    Update {
        /// Policy ID
        policy: String,

        #[command(flatten)]
        fields: PolicyFields,
    },

    /// Delete a policy
    #[command(alias = "rm")]
    Delete {
        /// Policy ID
        policy: String,
    },

    /// Apply a policy to a device
    Assign {
        /// Policy ID
        policy: String,
        /// Device ID
        device: String,
    },

    /// Remove a policy from a device
    Unassign {
        /// Policy ID
        policy: String,
        /// Device ID
        device: String,
    },

    /// List devices a policy applies to
    Devices {
        /// Policy ID
        policy: String,
    },

    /// List groups a policy applies to
    Groups {
        /// Policy ID
        policy: String,
    },

    /// Apply a policy to a device group
    AssignGroup {
        /// Policy ID
        policy: String,
        /// Group ID
        group: String,
    },

    /// Remove a policy from a device group
    UnassignGroup {
        /// Policy ID
        policy: String,
        /// Group ID
        group: String,
    },
}

#[derive(Debug, Args)]
pub struct PolicyFields {
    /// Policy name
    #[arg(long)]
    pub name: Option<String>,

    /// Description
    #[arg(long)]
    pub description: Option<String>,

    /// Target platform
    #[arg(long)]
    pub platform: Option<String>,

    /// Enable or disable the policy
    #[arg(long)]
    pub enabled: Option<bool>,

    /// Configuration as an inline JSON object
    #[arg(long, conflicts_with = "from_file")]
    pub config: Option<String>,

    /// Read configuration from a JSON file
    #[arg(long, short = 'F')]
    pub from_file: Option<PathBuf>,
}

// ── Applications ─────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct AppsArgs {
    #[command(subcommand)]
    pub command: AppsCommand,
}

#[derive(Debug, Subcommand)]
pub enum AppsCommand {
    /// List applications
    #[command(alias = "ls")]
    List,

    /// Show one application
    Get {
        /// Application ID
        app: String,
    },

    /// Register an application, optionally uploading its package
    #[command(disable_version_flag = true)]
    Add {
        /// Application name
        #[arg(long)]
        name: String,

        /// Version string
        #[arg(long)]
        version: String,

        /// Target platform
        #[arg(long)]
        platform: String,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Package file to upload
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Update application metadata
    #[command(disable_version_flag = true)]
    Update {
        /// Application ID
        app: String,

        /// Application name
        #[arg(long)]
        name: Option<String>,

        /// Version string
        #[arg(long)]
        version: Option<String>,

        /// Target platform
        #[arg(long)]
        platform: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete an application
    #[command(alias = "rm")]
    Delete {
        /// Application ID
        app: String,
    },
}

// ── Groups ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List device groups
    #[command(alias = "ls")]
    List,

    /// Show one group
    Get {
        /// Group ID
        group: String,
    },

    /// Create a group
    Create {
        /// Group name
        #[arg(long)]
        name: String,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Update a group
    Update {
        /// Group ID
        group: String,

        /// Group name
        #[arg(long)]
        name: Option<String>,

        /// Description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a group
    #[command(alias = "rm")]
    Delete {
        /// Group ID
        group: String,
    },

    /// Add a device to a group
    AddDevice {
        /// Group ID
        group: String,
        /// Device ID
        device: String,
    },

    /// Remove a device from a group
    RemoveDevice {
        /// Group ID
        group: String,
        /// Device ID
        device: String,
    },

    /// List a group's devices
    Devices {
        /// Group ID
        group: String,
    },
}

// ── Watch ────────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct WatchArgs {
    /// Stop after this many events
    #[arg(long, short = 'n')]
    pub count: Option<usize>,
}

// ── Config ───────────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Print the config file path
    Path,

    /// Set the server URL for the selected profile (creates it if needed)
    SetServer {
        /// API base URL
        url: String,
    },

    /// Make a profile the default
    Use {
        /// Profile name
        name: String,
    },
}

// ── Completions ──────────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Target shell
    pub shell: clap_complete::Shell,
}
