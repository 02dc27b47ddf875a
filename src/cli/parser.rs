use clap::{Parser, Subcommand};

/// Command-line interface definition for jornada
/// Operator harness around the shift tracking engine
#[derive(Parser)]
#[command(
    name = "jornada",
    version = env!("CARGO_PKG_VERSION"),
    about = "Shift tracking: geofenced punches, break rules, day/night overtime and auto-close",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    /// Pin the clock to a Colombian wall time (YYYY-MM-DD HH:MM)
    #[arg(global = true, long = "now", hide = true)]
    pub now: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Register or update a regional office
    Regional {
        id: i64,
        name: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: Option<f64>,

        #[arg(long, allow_hyphen_values = true)]
        lon: Option<f64>,
    },

    /// Register or update a worker
    Worker {
        id: i64,
        name: String,

        #[arg(long, default_value = "")]
        email: String,

        #[arg(long, help = "Regional the worker belongs to")]
        regional: Option<i64>,

        #[arg(long, help = "Visitor worker (travels between client sites)")]
        visitor: bool,
    },

    /// Assign a specific work site to a worker
    Site {
        worker: i64,
        name: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, help = "Tolerance radius in meters (default from config)")]
        tolerance: Option<f64>,
    },

    /// Record a punch
    Punch {
        worker: i64,

        /// entrada, descanso_manana_inicio, ..., almuerzo_fin, ..., salida
        kind: String,

        #[arg(long, allow_hyphen_values = true)]
        lat: f64,

        #[arg(long, allow_hyphen_values = true)]
        lon: f64,

        #[arg(long, help = "GPS accuracy in meters")]
        accuracy: Option<f64>,

        #[arg(long = "at", help = "Time a punch was taken on the device (YYYY-MM-DD HH:MM), default now")]
        at: Option<String>,

        #[arg(long = "obs")]
        observations: Option<String>,

        #[arg(
            long = "override",
            help = "Proceed with a break punch outside the geofence"
        )]
        geofence_override: bool,
    },

    /// Show the worker's current shift with live hours
    Status { worker: i64 },

    /// Hours report for a period
    Report {
        worker: i64,

        #[arg(
            long,
            short,
            help = "YYYY, YYYY-MM, YYYY-MM-DD or a range start:end (default current month)"
        )]
        period: Option<String>,

        #[arg(long = "legal-hours", help = "Legal daily hours for overtime")]
        legal_hours: Option<f64>,

        #[arg(long, help = "Print the report as JSON")]
        json: bool,
    },

    /// Run one auto-close scan now
    AutoClose,

    /// Run the recurring background tasks until Ctrl-C
    Scheduler,

    /// Print the internal audit log
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },
}
