//! Collaborators used by the command-line front end.

use crate::app::{GeolocationError, Geolocator, MapSurface, ViewOptions, WorkoutView};
use crate::render::{ListEntry, MarkerPopup};
use crate::types::{Coords, WorkoutKind};

/// Location fix taken from the command line.
pub struct FixedGeolocator {
    fix: Option<Coords>,
}

impl FixedGeolocator {
    pub const fn new(fix: Option<Coords>) -> Self {
        Self { fix }
    }
}

impl Geolocator for FixedGeolocator {
    fn current_position(&mut self) -> Result<Coords, GeolocationError> {
        self.fix.ok_or(GeolocationError::PermissionDenied)
    }
}

/// Keeps track of where the map is looking; markers are only logged.
#[derive(Debug)]
pub struct TerminalMap {
    center: Coords,
    zoom: u8,
    markers: usize,
}

impl TerminalMap {
    pub const fn new(center: Coords, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            markers: 0,
        }
    }

    pub const fn center(&self) -> Coords {
        self.center
    }

    pub const fn zoom(&self) -> u8 {
        self.zoom
    }

    pub const fn markers(&self) -> usize {
        self.markers
    }
}

impl MapSurface for TerminalMap {
    fn set_view(&mut self, center: Coords, zoom: u8, opts: ViewOptions) {
        tracing::debug!(%center, zoom, animate = opts.animate, "map view");
        self.center = center;
        self.zoom = zoom;
    }

    fn add_marker(&mut self, at: Coords, popup: &MarkerPopup) {
        tracing::info!(at = %at, class = %popup.class_name, "{}", popup.content);
        self.markers += 1;
    }
}

/// Collects rendered entries so the caller decides what to print.
#[derive(Debug, Default)]
pub struct TerminalView {
    entries: Vec<ListEntry>,
    metric_kind: Option<WorkoutKind>,
}

impl TerminalView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[ListEntry] {
        &self.entries
    }
}

impl WorkoutView for TerminalView {
    fn show_form(&mut self) {
        tracing::debug!("form opened");
    }

    fn hide_form(&mut self) {
        self.metric_kind = None;
        tracing::debug!("form closed");
    }

    fn toggle_metric_field(&mut self, kind: WorkoutKind) {
        self.metric_kind = Some(kind);
    }

    fn alert(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn render_entry(&mut self, entry: &ListEntry) {
        self.entries.push(entry.clone());
    }
}

/// Tab separated: id, title, then `value unit` per detail.
pub fn format_entry(entry: &ListEntry) -> String {
    let mut line = format!("{}\t{}", entry.id, entry.title);
    for d in &entry.details {
        line.push('\t');
        line.push_str(&format!("{} {} {}", d.icon, d.value, d.unit));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Detail;

    #[test]
    fn geolocator_without_fix_is_denied() {
        assert_eq!(
            FixedGeolocator::new(None).current_position(),
            Err(GeolocationError::PermissionDenied)
        );
        let here = Coords::new(1.0, 2.0);
        assert_eq!(FixedGeolocator::new(Some(here)).current_position(), Ok(here));
    }

    #[test]
    fn entry_line_is_tab_separated() {
        let entry = ListEntry {
            id: "42".into(),
            kind: WorkoutKind::Running,
            title: "Running on April 14".into(),
            details: vec![Detail {
                icon: "⏱",
                value: "30".into(),
                unit: "min",
            }],
        };
        assert_eq!(format_entry(&entry), "42\tRunning on April 14\t⏱ 30 min");
    }
}
