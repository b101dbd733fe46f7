#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Result, bail};
use clap::Parser;
use trailpin::app::{App, SubmitError};
use trailpin::cli::{self, Backend, Cmd};
use trailpin::database::SqliteSlot;
use trailpin::factory::FormFields;
use trailpin::persistence::{FileSlot, PersistenceGateway, StorageSlot};
use trailpin::terminal::{self, FixedGeolocator, TerminalMap, TerminalView};
use trailpin::types::Coords;
use trailpin::utils;

#[macro_use]
extern crate trailpin;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);
    utils::ensure_data_dir(&cli.data_dir)?;

    dlog!(
        "data_dir={} backend={:?} no_location={}",
        cli.data_dir.display(),
        cli.backend,
        cli.no_location
    );

    let args = Args {
        fix: (!cli.no_location).then_some(cli.home),
        cmd: cli.cmd,
    };

    match cli.backend {
        Backend::File => run(args, FileSlot::new(&cli.data_dir)),
        Backend::Sqlite => {
            let slot = SqliteSlot::open(&cli.data_dir.join("trailpin.sqlite3"))?;
            run(args, slot)
        }
    }
}

fn run<S: StorageSlot>(args: Args, slot: S) -> Result<()> {
    let mut app: App<S, TerminalView, TerminalMap> =
        App::new(PersistenceGateway::new(slot), TerminalView::new());
    let mut geolocator = FixedGeolocator::new(args.fix);
    app.start(&mut geolocator, TerminalMap::new);

    match args.cmd {
        None | Some(Cmd::List) => {
            if app.store().is_empty() {
                tracing::info!("no workouts recorded yet");
            }
            for entry in app.view().entries() {
                println!("{}", terminal::format_entry(entry));
            }
            Ok(())
        }
        Some(Cmd::Add {
            at,
            kind,
            distance,
            duration,
            cadence,
            elevation,
        }) => {
            if !app.on_map_click(at) {
                bail!("No map available (location unavailable); cannot place a workout.");
            }
            app.on_type_change(kind);

            let fields = FormFields {
                kind,
                distance,
                duration,
                cadence,
                elevation,
            };
            match app.on_form_submit(&fields) {
                Ok(_) => {
                    if let Some(entry) = app.view().entries().last() {
                        println!("{}", terminal::format_entry(entry));
                    }
                    Ok(())
                }
                Err(SubmitError::Invalid(_)) => bail!("Workout not recorded."),
                Err(e) => Err(e.into()),
            }
        }
        Some(Cmd::Show { id }) => {
            if app.store().find_by_id(&id).is_none() {
                bail!("No workout with id {id}");
            }
            if !app.on_workout_list_click(&id) {
                bail!("No map available (location unavailable).");
            }
            if let Some(map) = app.map() {
                println!("{}\tzoom {}", map.center(), map.zoom());
            }
            Ok(())
        }
    }
}

/// What `run` needs from the command line once the backend is chosen.
struct Args {
    cmd: Option<Cmd>,
    fix: Option<Coords>,
}
