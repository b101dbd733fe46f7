use trailpin::app::{
    App, GeolocationError, Geolocator, MapSurface, SessionState, SubmitError, ViewOptions,
    WorkoutView,
};
use trailpin::database::SqliteSlot;
use trailpin::factory::FormFields;
use trailpin::persistence::{FileSlot, MemorySlot, PersistenceGateway, STORAGE_KEY, StorageSlot};
use trailpin::render::{self, ListEntry, MAP_ZOOM_LEVEL, MarkerPopup};
use trailpin::types::{Coords, DerivedMetric, WorkoutKind};

#[derive(Debug, Default)]
struct RecordingView {
    entries: Vec<ListEntry>,
    alerts: Vec<String>,
    form_open: bool,
    metric_kind: Option<WorkoutKind>,
}

impl WorkoutView for RecordingView {
    fn show_form(&mut self) {
        self.form_open = true;
    }
    fn hide_form(&mut self) {
        self.form_open = false;
    }
    fn toggle_metric_field(&mut self, kind: WorkoutKind) {
        self.metric_kind = Some(kind);
    }
    fn alert(&mut self, message: &str) {
        self.alerts.push(message.to_string());
    }
    fn render_entry(&mut self, entry: &ListEntry) {
        self.entries.push(entry.clone());
    }
}

#[derive(Debug, Default)]
struct RecordingMap {
    markers: Vec<(Coords, MarkerPopup)>,
    views: Vec<(Coords, u8, ViewOptions)>,
}

impl MapSurface for RecordingMap {
    fn set_view(&mut self, center: Coords, zoom: u8, opts: ViewOptions) {
        self.views.push((center, zoom, opts));
    }
    fn add_marker(&mut self, at: Coords, popup: &MarkerPopup) {
        self.markers.push((at, popup.clone()));
    }
}

struct Gps(Result<Coords, GeolocationError>);

impl Geolocator for Gps {
    fn current_position(&mut self) -> Result<Coords, GeolocationError> {
        self.0.clone()
    }
}

/// A slot whose writes always fail.
struct ReadOnlySlot;

impl StorageSlot for ReadOnlySlot {
    fn get_item(&self, _key: &str) -> Result<Option<String>, trailpin::persistence::StorageError> {
        Ok(None)
    }
    fn set_item(
        &mut self,
        _key: &str,
        _value: &str,
    ) -> Result<(), trailpin::persistence::StorageError> {
        Err(trailpin::persistence::StorageError::Io {
            op: "writing",
            path: "read-only".into(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only"),
        })
    }
}

const HOME: Coords = Coords::new(51.5074, -0.1278);
const PIN: Coords = Coords::new(51.5, -0.12);

fn started<S: StorageSlot>(slot: S) -> App<S, RecordingView, RecordingMap> {
    let mut app = App::new(PersistenceGateway::new(slot), RecordingView::default());
    app.start(&mut Gps(Ok(HOME)), |_, _| RecordingMap::default());
    app
}

fn running(distance: &str, duration: &str, cadence: &str) -> FormFields {
    FormFields {
        kind: WorkoutKind::Running,
        distance: distance.into(),
        duration: duration.into(),
        cadence: cadence.into(),
        elevation: String::new(),
    }
}

fn cycling(distance: &str, duration: &str, elevation: &str) -> FormFields {
    FormFields {
        kind: WorkoutKind::Cycling,
        distance: distance.into(),
        duration: duration.into(),
        cadence: String::new(),
        elevation: elevation.into(),
    }
}

#[test]
fn running_submit_stores_renders_and_saves_once() {
    let mut app = started(MemorySlot::new());
    assert!(app.on_map_click(PIN));
    assert!(app.view().form_open);

    let id = app.on_form_submit(&running("5", "30", "180")).unwrap();

    assert_eq!(app.store().len(), 1);
    let record = app.store().find_by_id(id.as_str()).unwrap();
    assert_eq!(record.derived(), DerivedMetric::Pace(6.0));
    assert_eq!(record.coords(), PIN);
    assert!(record.is_live());

    assert_eq!(app.view().entries.len(), 1);
    assert_eq!(app.view().entries[0].id, id);
    let markers = &app.map().unwrap().markers;
    assert_eq!(markers.len(), 1);
    assert_eq!(markers[0].0, PIN);
    assert_eq!(markers[0].1.class_name, "running-popup");

    assert_eq!(app.gateway().slot().writes(), 1);
    assert!(!app.view().form_open);
    assert_eq!(app.state(), SessionState::AwaitingLocation);
}

#[test]
fn cycling_submit_derives_speed() {
    let mut app = started(MemorySlot::new());
    app.on_map_click(PIN);
    app.on_type_change(WorkoutKind::Cycling);
    assert_eq!(app.view().metric_kind, Some(WorkoutKind::Cycling));

    let id = app.on_form_submit(&cycling("10", "40", "150")).unwrap();
    let DerivedMetric::Speed(speed) = app.store().find_by_id(id.as_str()).unwrap().derived()
    else {
        panic!("expected speed");
    };
    assert!((speed - 15.0).abs() < 1e-9);
}

#[test]
fn rejected_submit_changes_nothing() {
    let mut app = started(MemorySlot::new());
    app.on_map_click(PIN);

    let err = app.on_form_submit(&running("-5", "30", "180")).unwrap_err();
    assert!(matches!(err, SubmitError::Invalid(_)));

    assert!(app.store().is_empty());
    assert_eq!(app.gateway().slot().writes(), 0);
    assert!(app.gateway().load().is_empty());
    assert!(app.view().entries.is_empty());
    assert!(app.map().unwrap().markers.is_empty());
    assert_eq!(app.view().alerts.len(), 1);
    assert_eq!(app.state(), SessionState::FormOpen { pending: PIN });
}

#[test]
fn empty_storage_renders_nothing() {
    let app = started(MemorySlot::new());
    assert!(app.store().is_empty());
    assert!(app.view().entries.is_empty());
    assert!(app.view().alerts.is_empty());
    let map = app.map().unwrap();
    assert!(map.markers.is_empty());
    assert_eq!(map.views, [(HOME, MAP_ZOOM_LEVEL, ViewOptions::INSTANT)]);
}

#[test]
fn next_session_restores_list_and_markers() {
    let dir = tempfile::tempdir().unwrap();

    let mut first = started(FileSlot::new(dir.path()));
    first.on_map_click(PIN);
    let run_id = first.on_form_submit(&running("5", "30", "180")).unwrap();
    let other = Coords::new(48.85, 2.35);
    first.on_map_click(other);
    let ride_id = first.on_form_submit(&cycling("10", "40", "150")).unwrap();
    drop(first);

    let mut second = started(FileSlot::new(dir.path()));
    let ids: Vec<_> = second.store().all().iter().map(|r| r.id().clone()).collect();
    assert_eq!(ids, [run_id.clone(), ride_id.clone()]);
    assert!(second.store().all().iter().all(|r| !r.is_live()));
    let restored_speed = second
        .store()
        .find_by_id(ride_id.as_str())
        .unwrap()
        .derived()
        .value();
    assert!((restored_speed - 15.0).abs() < 1e-9);

    let listed: Vec<_> = second.view().entries.iter().map(|e| e.id.clone()).collect();
    assert_eq!(listed, ids);
    assert_eq!(second.map().unwrap().markers.len(), 2);

    // New ids never collide with restored ones.
    second.on_map_click(PIN);
    let fresh = second.on_form_submit(&running("3", "20", "170")).unwrap();
    assert_ne!(fresh, run_id);
    assert_ne!(fresh, ride_id);
    assert_eq!(second.store().len(), 3);

    assert!(second.on_workout_list_click(run_id.as_str()));
    assert_eq!(
        second.map().unwrap().views.last(),
        Some(&(PIN, MAP_ZOOM_LEVEL, ViewOptions::PAN))
    );
}

#[test]
fn sqlite_backend_round_trips_a_session() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("trailpin.sqlite3");

    let mut app = started(SqliteSlot::open(&path).unwrap());
    app.on_map_click(PIN);
    app.on_form_submit(&running("5", "30", "180")).unwrap();
    drop(app);

    let app = started(SqliteSlot::open(&path).unwrap());
    assert_eq!(app.store().len(), 1);
    assert_eq!(app.store().all()[0].derived(), DerivedMetric::Pace(6.0));
}

#[test]
fn history_written_by_the_browser_widget_is_restored() {
    let blob = r#"[{"date":"2024-04-14T09:30:00.000Z","id":"3087000123","distance":"5","duration":"30","coords":[51.5,-0.12],"type":"running","cadence":180,"pace":6}]"#;
    let app = started(MemorySlot::with_item(STORAGE_KEY, blob));
    assert_eq!(app.store().len(), 1);
    assert_eq!(app.view().entries[0].title, render::title(&app.store().all()[0]));
    assert_eq!(
        render::title_in(&app.store().all()[0], &chrono::Utc),
        "Running on April 14"
    );
}

#[test]
fn denied_location_leaves_the_list_but_no_map() {
    let mut app: App<MemorySlot, RecordingView, RecordingMap> =
        App::new(PersistenceGateway::new(MemorySlot::new()), RecordingView::default());
    app.start(&mut Gps(Err(GeolocationError::PermissionDenied)), |_, _| {
        RecordingMap::default()
    });

    assert!(app.map().is_none());
    assert!(!app.on_map_click(PIN));
    assert!(matches!(
        app.on_form_submit(&running("5", "30", "180")),
        Err(SubmitError::NoPendingLocation)
    ));
}

#[test]
fn failed_save_is_reported_after_the_workout_is_listed() {
    let mut app = started(ReadOnlySlot);
    app.on_map_click(PIN);
    let err = app.on_form_submit(&running("5", "30", "180")).unwrap_err();

    let SubmitError::NotSaved { id, .. } = &err else {
        panic!("expected NotSaved, got {err:?}");
    };
    assert!(app.store().find_by_id(id.as_str()).is_some());
    assert_eq!(app.view().entries.len(), 1);
    assert_eq!(app.state(), SessionState::AwaitingLocation);
}
