use crate::dlog;
use crate::factory::{FormFields, ValidationError, WorkoutFactory};
use crate::persistence::{PersistenceGateway, StorageError, StorageSlot};
use crate::render::{self, ListEntry, MAP_ZOOM_LEVEL, MarkerPopup};
use crate::store::WorkoutStore;
use crate::types::{Coords, WorkoutId, WorkoutKind, WorkoutRecord};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewOptions {
    pub animate: bool,
    pub pan_duration_secs: f64,
}

impl ViewOptions {
    pub const INSTANT: Self = Self {
        animate: false,
        pan_duration_secs: 0.0,
    };

    pub const PAN: Self = Self {
        animate: true,
        pan_duration_secs: 1.0,
    };
}

/// The map the workouts are pinned on.
pub trait MapSurface {
    fn set_view(&mut self, center: Coords, zoom: u8, opts: ViewOptions);
    fn add_marker(&mut self, at: Coords, popup: &MarkerPopup);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    Unavailable(String),
}

/// Single-shot, best-effort source of the user's position.
pub trait Geolocator {
    fn current_position(&mut self) -> Result<Coords, GeolocationError>;
}

/// Form and list side of the widget.
pub trait WorkoutView {
    fn show_form(&mut self);
    /// Clear the inputs and hide the form.
    fn hide_form(&mut self);
    /// Show the cadence or elevation input depending on `kind`.
    fn toggle_metric_field(&mut self, kind: WorkoutKind);
    fn alert(&mut self, message: &str);
    fn render_entry(&mut self, entry: &ListEntry);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SessionState {
    AwaitingLocation,
    FormOpen { pending: Coords },
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("no map location selected")]
    NoPendingLocation,
    #[error(transparent)]
    Invalid(#[from] ValidationError),
    /// The workout is in the list and on the map, but the write failed.
    #[error("workout {id} recorded but not saved: {source}")]
    NotSaved {
        id: WorkoutId,
        #[source]
        source: StorageError,
    },
}

/// Owns the workout list for the session and reacts to UI events.
pub struct App<S, V, M> {
    store: WorkoutStore,
    gateway: PersistenceGateway<S>,
    factory: WorkoutFactory,
    view: V,
    map: Option<M>,
    state: SessionState,
}

impl<S, V, M> App<S, V, M>
where
    S: StorageSlot,
    V: WorkoutView,
    M: MapSurface,
{
    pub fn new(gateway: PersistenceGateway<S>, view: V) -> Self {
        Self {
            store: WorkoutStore::new(),
            gateway,
            factory: WorkoutFactory::new(),
            view,
            map: None,
            state: SessionState::AwaitingLocation,
        }
    }

    /// Restore saved workouts, then try to bring up the map.
    ///
    /// Without a location fix the session continues with the list only.
    pub fn start<G, F>(&mut self, geolocator: &mut G, create_map: F)
    where
        G: Geolocator,
        F: FnOnce(Coords, u8) -> M,
    {
        self.restore();
        match geolocator.current_position() {
            Ok(center) => {
                let map = create_map(center, MAP_ZOOM_LEVEL);
                self.on_map_ready(center, map);
            }
            Err(e) => {
                tracing::warn!(err = %e, "no location fix; continuing without a map");
            }
        }
    }

    /// Replace the list with whatever storage holds and render each entry.
    pub fn restore(&mut self) -> usize {
        let stored = self.gateway.load();
        for s in &stored {
            self.factory.observe(&s.id);
        }
        self.store
            .replace_all(stored.into_iter().map(WorkoutRecord::Restored).collect());

        for record in self.store.all() {
            self.view.render_entry(&render::list_entry(record));
        }
        self.store.len()
    }

    /// Attach the map and pin every workout already in the list.
    pub fn on_map_ready(&mut self, center: Coords, mut map: M) {
        map.set_view(center, MAP_ZOOM_LEVEL, ViewOptions::INSTANT);
        for record in self.store.all() {
            map.add_marker(record.coords(), &render::marker_popup(record));
        }
        tracing::info!(%center, markers = self.store.len(), "map ready");
        self.map = Some(map);
    }

    /// Returns false when there is no map to click on.
    pub fn on_map_click(&mut self, coords: Coords) -> bool {
        if self.map.is_none() {
            dlog!("map click ignored; no map surface");
            return false;
        }
        self.state = SessionState::FormOpen { pending: coords };
        self.view.show_form();
        true
    }

    pub fn on_type_change(&mut self, kind: WorkoutKind) {
        self.view.toggle_metric_field(kind);
    }

    pub fn on_form_cancel(&mut self) {
        if let SessionState::FormOpen { .. } = self.state {
            self.state = SessionState::AwaitingLocation;
            self.view.hide_form();
        }
    }

    pub fn on_form_submit(&mut self, fields: &FormFields) -> Result<WorkoutId, SubmitError> {
        let SessionState::FormOpen { pending } = self.state else {
            return Err(SubmitError::NoPendingLocation);
        };

        let workout = match self.factory.create_from_form(fields, pending) {
            Ok(w) => w,
            Err(e) => {
                tracing::info!(err = %e, "workout input rejected");
                self.view.alert(&e.to_string());
                return Err(e.into());
            }
        };

        let record = WorkoutRecord::Live(workout);
        let id = record.id().clone();
        let popup = render::marker_popup(&record);
        let entry = render::list_entry(&record);
        self.store.append(record);

        if let Some(map) = self.map.as_mut() {
            map.add_marker(pending, &popup);
        }
        self.view.render_entry(&entry);
        self.view.hide_form();
        self.state = SessionState::AwaitingLocation;

        tracing::info!(%id, kind = %fields.kind, total = self.store.len(), "workout added");

        self.gateway
            .save(self.store.all())
            .map_err(|source| SubmitError::NotSaved {
                id: id.clone(),
                source,
            })?;
        Ok(id)
    }

    /// Centre the map on a workout picked from the list. Unknown ids and a
    /// missing map are ignored.
    pub fn on_workout_list_click(&mut self, id: &str) -> bool {
        let Some(record) = self.store.find_by_id(id) else {
            dlog!("list click for unknown workout id={id}");
            return false;
        };
        let Some(map) = self.map.as_mut() else {
            return false;
        };
        map.set_view(record.coords(), MAP_ZOOM_LEVEL, ViewOptions::PAN);
        true
    }

    pub const fn store(&self) -> &WorkoutStore {
        &self.store
    }

    pub const fn state(&self) -> SessionState {
        self.state
    }

    pub const fn view(&self) -> &V {
        &self.view
    }

    pub const fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub const fn gateway(&self) -> &PersistenceGateway<S> {
        &self.gateway
    }
}
