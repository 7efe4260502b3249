use clap::{Args as ClapArgs, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(version, about = "Diagnose Chrome fleet policy problems from live or canned data")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (defaults to ./fleetscope.toml when present).
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Replay a fixture bundle instead of calling the live APIs.
    #[arg(long, global = true)]
    pub fixture: Option<String>,

    /// Case id inside the fixture bundle.
    #[arg(long, global = true)]
    pub case: Option<String>,

    /// Print compact instead of pretty JSON.
    #[arg(long, default_value_t = false, global = true)]
    pub compact: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct DiagnoseArgs {
    /// Free-text description of the problem.
    #[arg(long, group = "input")]
    pub prompt: Option<String>,

    #[arg(long, group = "input")]
    pub prompt_file: Option<String>,

    /// Read the problem description from stdin.
    #[arg(long, group = "input")]
    pub stdin: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ToolArgs {
    /// Tool name, e.g. `get_events` (see `fleetscope tools`).
    pub name: String,

    /// Tool arguments as a JSON object.
    #[arg(long)]
    pub args: Option<String>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct OverviewArgs {
    #[arg(long, default_value_t = 50)]
    pub max_events: u32,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EnrollArgs {
    /// Org unit path the enrolled browsers should land in.
    #[arg(long)]
    pub org_unit: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the full diagnosis for a problem statement.
    Diagnose(DiagnoseArgs),
    /// Call a single tool by name.
    Tool(ToolArgs),
    /// List the available tools.
    Tools,
    /// Summarize fleet configuration.
    Overview(OverviewArgs),
    /// Create a browser enrollment token.
    Enroll(EnrollArgs),
}
