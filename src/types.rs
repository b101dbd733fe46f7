use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A latitude/longitude pair. Persisted as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat, self.lng)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordsParseError {
    #[error("expected LAT,LNG but got {0:?}")]
    Shape(String),
    #[error("invalid coordinate {0:?}")]
    Number(String),
    #[error("coordinates out of range: {0}")]
    Range(String),
}

impl FromStr for Coords {
    type Err = CoordsParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let Some((lat, lng)) = s.split_once(',') else {
            return Err(CoordsParseError::Shape(s.to_string()));
        };
        let parse = |v: &str| {
            v.trim()
                .parse::<f64>()
                .map_err(|_| CoordsParseError::Number(v.trim().to_string()))
        };
        let (lat, lng) = (parse(lat)?, parse(lng)?);
        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(CoordsParseError::Range(s.to_string()));
        }
        Ok(Self { lat, lng })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutKind {
    Running,
    Cycling,
}

impl WorkoutKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalised name used in titles.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown workout type {0:?} (expected running or cycling)")]
pub struct UnknownKind(String);

impl FromStr for WorkoutKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            _ => Err(UnknownKind(s.to_string())),
        }
    }
}

/// Opaque workout identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkoutId(String);

impl WorkoutId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for WorkoutId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hands out strictly increasing ids seeded from the wall clock (ms).
///
/// Two workouts created within the same millisecond still get distinct ids,
/// and ids already present in restored history are never reissued.
///
/// Once the numeric sequence is exhausted (only reachable through a restored
/// id of `u64::MAX`), ids continue as `<u64::MAX>-<n>`.
#[derive(Debug, Default)]
pub struct IdGenerator {
    last: u64,
    overflow: u64,
}

impl IdGenerator {
    pub fn next_id(&mut self, now: DateTime<Utc>) -> WorkoutId {
        let millis = u64::try_from(now.timestamp_millis()).unwrap_or(0);
        match self.last.checked_add(1) {
            Some(next) => {
                self.last = millis.max(next);
                WorkoutId(self.last.to_string())
            }
            None => {
                self.overflow = self.overflow.saturating_add(1);
                WorkoutId(format!("{}-{}", self.last, self.overflow))
            }
        }
    }

    /// Make sure ids seen elsewhere are never handed out again.
    pub fn observe(&mut self, id: &WorkoutId) {
        let id = id.as_str();
        if let Ok(v) = id.parse::<u64>() {
            self.last = self.last.max(v);
        } else if let Some((head, n)) = id.split_once('-')
            && head.parse::<u64>() == Ok(u64::MAX)
            && let Ok(n) = n.parse::<u64>()
        {
            self.last = u64::MAX;
            self.overflow = self.overflow.max(n);
        }
    }
}

/// min/km
pub(crate) fn pace_min_per_km(distance_km: f64, duration_min: f64) -> f64 {
    duration_min / distance_km
}

/// km/h
pub(crate) fn speed_km_per_h(distance_km: f64, duration_min: f64) -> f64 {
    distance_km / (duration_min / 60.0)
}

/// The type-specific input metric.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TypeMetric {
    /// steps/min
    Cadence(f64),
    /// metres
    ElevationGain(f64),
}

/// Metric computed from distance and duration at creation time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DerivedMetric {
    /// min/km
    Pace(f64),
    /// km/h
    Speed(f64),
}

impl DerivedMetric {
    pub const fn value(self) -> f64 {
        match self {
            Self::Pace(v) | Self::Speed(v) => v,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Common {
    pub(crate) id: WorkoutId,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) distance_km: f64,
    pub(crate) duration_min: f64,
    pub(crate) coords: Coords,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Running {
    common: Common,
    cadence: f64,
    pace: f64,
}

impl Running {
    pub(crate) fn new(common: Common, cadence: f64) -> Self {
        let pace = pace_min_per_km(common.distance_km, common.duration_min);
        Self {
            common,
            cadence,
            pace,
        }
    }

    pub const fn cadence(&self) -> f64 {
        self.cadence
    }

    /// min/km
    pub const fn pace(&self) -> f64 {
        self.pace
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cycling {
    common: Common,
    elevation_gain_m: f64,
    speed: f64,
}

impl Cycling {
    pub(crate) fn new(common: Common, elevation_gain_m: f64) -> Self {
        let speed = speed_km_per_h(common.distance_km, common.duration_min);
        Self {
            common,
            elevation_gain_m,
            speed,
        }
    }

    pub const fn elevation_gain_m(&self) -> f64 {
        self.elevation_gain_m
    }

    /// km/h
    pub const fn speed(&self) -> f64 {
        self.speed
    }
}

/// A workout built from validated input in this session.
///
/// Fields are private: the derived metric can only come from the constructor.
#[derive(Debug, Clone, PartialEq)]
pub enum Workout {
    Running(Running),
    Cycling(Cycling),
}

impl Workout {
    const fn common(&self) -> &Common {
        match self {
            Self::Running(r) => &r.common,
            Self::Cycling(c) => &c.common,
        }
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Running(_) => WorkoutKind::Running,
            Self::Cycling(_) => WorkoutKind::Cycling,
        }
    }

    pub const fn id(&self) -> &WorkoutId {
        &self.common().id
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        self.common().created_at
    }

    pub const fn coords(&self) -> Coords {
        self.common().coords
    }

    pub const fn distance_km(&self) -> f64 {
        self.common().distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.common().duration_min
    }

    pub const fn metric(&self) -> TypeMetric {
        match self {
            Self::Running(r) => TypeMetric::Cadence(r.cadence),
            Self::Cycling(c) => TypeMetric::ElevationGain(c.elevation_gain_m),
        }
    }

    pub const fn derived(&self) -> DerivedMetric {
        match self {
            Self::Running(r) => DerivedMetric::Pace(r.pace),
            Self::Cycling(c) => DerivedMetric::Speed(c.speed),
        }
    }

    /// Plain field data for persistence.
    pub fn to_stored(&self) -> StoredWorkout {
        let c = self.common();
        let metrics = match self {
            Self::Running(r) => StoredMetrics::Running {
                cadence: r.cadence,
                pace: r.pace,
            },
            Self::Cycling(cy) => StoredMetrics::Cycling {
                elevation_gain: cy.elevation_gain_m,
                speed: cy.speed,
            },
        };
        StoredWorkout {
            id: c.id.clone(),
            created_at: c.created_at,
            distance: c.distance_km,
            duration: c.duration_min,
            coords: c.coords,
            metrics,
        }
    }
}

/// Workout as it sits in storage: plain fields plus a `"type"` tag.
///
/// Nothing is recomputed from these values; the derived metric is whatever was
/// written when the workout was saved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredWorkout {
    pub id: WorkoutId,
    #[serde(rename = "date")]
    pub created_at: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_f64")]
    pub distance: f64,
    #[serde(deserialize_with = "lenient_f64")]
    pub duration: f64,
    pub coords: Coords,
    #[serde(flatten)]
    pub metrics: StoredMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StoredMetrics {
    Running {
        #[serde(deserialize_with = "lenient_f64")]
        cadence: f64,
        #[serde(deserialize_with = "lenient_f64")]
        pace: f64,
    },
    Cycling {
        #[serde(rename = "elevationGain", deserialize_with = "lenient_f64")]
        elevation_gain: f64,
        #[serde(deserialize_with = "lenient_f64")]
        speed: f64,
    },
}

impl StoredWorkout {
    pub const fn kind(&self) -> WorkoutKind {
        match self.metrics {
            StoredMetrics::Running { .. } => WorkoutKind::Running,
            StoredMetrics::Cycling { .. } => WorkoutKind::Cycling,
        }
    }

    pub const fn metric(&self) -> TypeMetric {
        match self.metrics {
            StoredMetrics::Running { cadence, .. } => TypeMetric::Cadence(cadence),
            StoredMetrics::Cycling { elevation_gain, .. } => {
                TypeMetric::ElevationGain(elevation_gain)
            }
        }
    }

    pub const fn derived(&self) -> DerivedMetric {
        match self.metrics {
            StoredMetrics::Running { pace, .. } => DerivedMetric::Pace(pace),
            StoredMetrics::Cycling { speed, .. } => DerivedMetric::Speed(speed),
        }
    }
}

/// Older blobs carry numbers as strings (`"distance": "5"`).
fn lenient_f64<'de, D>(de: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumOrText {
        Num(f64),
        Text(String),
    }

    match NumOrText::deserialize(de)? {
        NumOrText::Num(v) => Ok(v),
        NumOrText::Text(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| serde::de::Error::custom(format!("not a number: {s:?}"))),
    }
}

/// An entry of the workout list: either built this session or restored from
/// storage.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkoutRecord {
    Live(Workout),
    Restored(StoredWorkout),
}

impl WorkoutRecord {
    pub const fn id(&self) -> &WorkoutId {
        match self {
            Self::Live(w) => w.id(),
            Self::Restored(s) => &s.id,
        }
    }

    pub const fn kind(&self) -> WorkoutKind {
        match self {
            Self::Live(w) => w.kind(),
            Self::Restored(s) => s.kind(),
        }
    }

    pub const fn created_at(&self) -> DateTime<Utc> {
        match self {
            Self::Live(w) => w.created_at(),
            Self::Restored(s) => s.created_at,
        }
    }

    pub const fn coords(&self) -> Coords {
        match self {
            Self::Live(w) => w.coords(),
            Self::Restored(s) => s.coords,
        }
    }

    pub const fn distance_km(&self) -> f64 {
        match self {
            Self::Live(w) => w.distance_km(),
            Self::Restored(s) => s.distance,
        }
    }

    pub const fn duration_min(&self) -> f64 {
        match self {
            Self::Live(w) => w.duration_min(),
            Self::Restored(s) => s.duration,
        }
    }

    pub const fn metric(&self) -> TypeMetric {
        match self {
            Self::Live(w) => w.metric(),
            Self::Restored(s) => s.metric(),
        }
    }

    pub const fn derived(&self) -> DerivedMetric {
        match self {
            Self::Live(w) => w.derived(),
            Self::Restored(s) => s.derived(),
        }
    }

    pub const fn is_live(&self) -> bool {
        matches!(self, Self::Live(_))
    }

    pub fn to_stored(&self) -> StoredWorkout {
        match self {
            Self::Live(w) => w.to_stored(),
            Self::Restored(s) => s.clone(),
        }
    }
}

impl From<Workout> for WorkoutRecord {
    fn from(w: Workout) -> Self {
        Self::Live(w)
    }
}

impl From<StoredWorkout> for WorkoutRecord {
    fn from(s: StoredWorkout) -> Self {
        Self::Restored(s)
    }
}
