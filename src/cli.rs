use crate::types::{Coords, WorkoutKind};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

const DEFAULT_DATA_DIR: &str = "trailpin-data";
const DEFAULT_HOME: &str = "51.5074,-0.1278";

#[derive(Parser, Debug)]
#[command(
    name = "trailpin",
    about = "Pin running and cycling workouts on a map and keep them between sessions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub cmd: Option<Cmd>,

    /// Directory holding the saved workouts.
    #[arg(long, value_name = "DIR", default_value = DEFAULT_DATA_DIR, global = true)]
    pub data_dir: PathBuf,

    /// Storage backend for the workout list.
    #[arg(long, value_enum, default_value_t = Backend::File, global = true)]
    pub backend: Backend,

    /// Location fix the map is centred on at startup (LAT,LNG).
    #[arg(long, value_name = "LAT,LNG", default_value = DEFAULT_HOME, allow_hyphen_values = true, global = true)]
    pub home: Coords,

    /// Behave as if location access was denied (no map for this session).
    #[arg(long, global = true)]
    pub no_location: bool,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Drop a pin and record a workout there.
    Add {
        /// Where the workout happened (LAT,LNG).
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        at: Coords,

        #[arg(long = "type", value_name = "TYPE", default_value = "running")]
        kind: WorkoutKind,

        /// km
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// min
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// steps/min (running)
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cadence: String,

        /// metres (cycling)
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        elevation: String,
    },
    /// Print the saved workouts (default).
    List,
    /// Centre the map on a saved workout.
    Show {
        /// Workout id as printed by `list`.
        id: String,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    /// `<data-dir>/workout.json`
    File,
    /// `<data-dir>/trailpin.sqlite3`
    Sqlite,
}
