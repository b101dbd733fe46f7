use crate::dlog;
use crate::types::{
    Common, Coords, Cycling, IdGenerator, Running, Workout, WorkoutId, WorkoutKind,
    pace_min_per_km, speed_km_per_h,
};
use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

/// Raw values as typed into the workout form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFields {
    pub kind: WorkoutKind,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl FormFields {
    /// The metric input that applies to the selected workout type.
    pub fn metric_input(&self) -> &str {
        match self.kind {
            WorkoutKind::Running => &self.cadence,
            WorkoutKind::Cycling => &self.elevation,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    ElevationGain,
    Pace,
    Speed,
}

impl Field {
    const fn metric_for(kind: WorkoutKind) -> Self {
        match kind {
            WorkoutKind::Running => Self::Cadence,
            WorkoutKind::Cycling => Self::ElevationGain,
        }
    }

    const fn derived_for(kind: WorkoutKind) -> Self {
        match kind {
            WorkoutKind::Running => Self::Pace,
            WorkoutKind::Cycling => Self::Speed,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Cadence => "cadence",
            Self::ElevationGain => "elevation gain",
            Self::Pace => "pace",
            Self::Speed => "speed",
        })
    }
}

/// Rejected form input. The message is shown to the user as-is.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} has to be a positive number (got {raw:?})")]
    NotANumber { field: Field, raw: String },
    #[error("{field} has to be a finite number")]
    NotFinite { field: Field },
    #[error("{field} has to be a positive number (got {value})")]
    NotPositive { field: Field, value: f64 },
}

impl ValidationError {
    pub const fn field(&self) -> Field {
        match self {
            Self::NotANumber { field, .. }
            | Self::NotFinite { field }
            | Self::NotPositive { field, .. } => *field,
        }
    }
}

/// Parse one form value; it must be a finite number strictly above zero.
pub fn parse_positive(field: Field, raw: &str) -> Result<f64, ValidationError> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ValidationError::NotANumber {
            field,
            raw: raw.to_string(),
        })?;
    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field });
    }
    if value <= 0.0 {
        return Err(ValidationError::NotPositive { field, value });
    }
    Ok(value)
}

/// Builds live workouts from raw input and owns the session's id sequence.
#[derive(Debug, Default)]
pub struct WorkoutFactory {
    ids: IdGenerator,
}

impl WorkoutFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(
        &mut self,
        kind: WorkoutKind,
        raw_distance: &str,
        raw_duration: &str,
        coords: Coords,
        raw_metric: &str,
    ) -> Result<Workout, ValidationError> {
        self.create_at(kind, raw_distance, raw_duration, coords, raw_metric, Utc::now())
    }

    /// Same as [`Self::create`] with an explicit creation time.
    ///
    /// An id is only consumed once every input has been accepted.
    pub fn create_at(
        &mut self,
        kind: WorkoutKind,
        raw_distance: &str,
        raw_duration: &str,
        coords: Coords,
        raw_metric: &str,
        now: DateTime<Utc>,
    ) -> Result<Workout, ValidationError> {
        let distance_km = parse_positive(Field::Distance, raw_distance)?;
        let duration_min = parse_positive(Field::Duration, raw_duration)?;
        let metric = parse_positive(Field::metric_for(kind), raw_metric)?;

        // Extreme but individually valid inputs can still overflow, and a
        // non-finite value would not survive the JSON round trip.
        let derived = match kind {
            WorkoutKind::Running => pace_min_per_km(distance_km, duration_min),
            WorkoutKind::Cycling => speed_km_per_h(distance_km, duration_min),
        };
        if !derived.is_finite() {
            return Err(ValidationError::NotFinite {
                field: Field::derived_for(kind),
            });
        }

        let common = Common {
            id: self.ids.next_id(now),
            created_at: now,
            distance_km,
            duration_min,
            coords,
        };
        dlog!(
            "workout_created id={} kind={kind} distance_km={distance_km} duration_min={duration_min} metric={metric}",
            common.id
        );

        Ok(match kind {
            WorkoutKind::Running => Workout::Running(Running::new(common, metric)),
            WorkoutKind::Cycling => Workout::Cycling(Cycling::new(common, metric)),
        })
    }

    pub fn create_from_form(
        &mut self,
        fields: &FormFields,
        coords: Coords,
    ) -> Result<Workout, ValidationError> {
        self.create(
            fields.kind,
            &fields.distance,
            &fields.duration,
            coords,
            fields.metric_input(),
        )
    }

    /// Reserve ids already used by restored workouts.
    pub fn observe(&mut self, id: &WorkoutId) {
        self.ids.observe(id);
    }
}
