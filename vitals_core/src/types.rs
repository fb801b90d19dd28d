//! Core domain types for the Vitals journal.
//!
//! This module defines:
//! - Readings and the caller-supplied fields they are built from
//! - Blood sugar measurement context labels
//! - The derived metrics snapshot handed to the display layer

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// Blood Sugar Context
// ============================================================================

/// When a blood sugar value was taken relative to meals.
///
/// Serialized as its plain label. Labels outside the known set are carried
/// verbatim in `Other` so nothing the user typed is lost on a round-trip.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BloodSugarContext {
    Fasting,
    BeforeMeal,
    PostMeal,
    Random,
    Bedtime,
    Other(String),
}

impl BloodSugarContext {
    pub fn as_str(&self) -> &str {
        match self {
            BloodSugarContext::Fasting => "fasting",
            BloodSugarContext::BeforeMeal => "before-meal",
            BloodSugarContext::PostMeal => "post-meal",
            BloodSugarContext::Random => "random",
            BloodSugarContext::Bedtime => "bedtime",
            BloodSugarContext::Other(label) => label,
        }
    }
}

impl Default for BloodSugarContext {
    fn default() -> Self {
        BloodSugarContext::Fasting
    }
}

impl From<String> for BloodSugarContext {
    fn from(label: String) -> Self {
        match label.as_str() {
            "fasting" => BloodSugarContext::Fasting,
            "before-meal" => BloodSugarContext::BeforeMeal,
            "post-meal" => BloodSugarContext::PostMeal,
            "random" => BloodSugarContext::Random,
            "bedtime" => BloodSugarContext::Bedtime,
            _ => BloodSugarContext::Other(label),
        }
    }
}

impl From<&str> for BloodSugarContext {
    fn from(label: &str) -> Self {
        BloodSugarContext::from(label.to_string())
    }
}

impl From<BloodSugarContext> for String {
    fn from(context: BloodSugarContext) -> Self {
        match context {
            BloodSugarContext::Other(label) => label,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for BloodSugarContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Readings
// ============================================================================

/// Field values for one reading, as supplied by the form collaborator.
///
/// Everything except the timestamp, which only the engine assigns.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReadingFields {
    pub systolic: i32,
    pub diastolic: i32,
    pub heart_rate: i32,
    pub oxygen_saturation: i32,
    pub weight: f64,
    pub temperature: f64,
    pub blood_sugar: i32,
    pub blood_sugar_context: BloodSugarContext,
    pub notes: String,
}

impl ReadingFields {
    /// Turn the submitted fields into a journal entry recorded at `at`.
    pub fn stamp(self, at: DateTime<Utc>) -> Reading {
        Reading {
            systolic: self.systolic,
            diastolic: self.diastolic,
            heart_rate: self.heart_rate,
            oxygen_saturation: self.oxygen_saturation,
            weight: self.weight,
            temperature: self.temperature,
            blood_sugar: self.blood_sugar,
            blood_sugar_context: self.blood_sugar_context,
            notes: self.notes,
            timestamp: at,
        }
    }
}

/// One recorded vital-sign measurement.
///
/// The persisted keys match the ones the journal has always been written
/// with (`heartRate`, `oxygenSat`, `sugarType`, ...), so existing journals
/// keep loading.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reading {
    pub systolic: i32,
    pub diastolic: i32,
    pub heart_rate: i32,
    #[serde(rename = "oxygenSat")]
    pub oxygen_saturation: i32,
    pub weight: f64,
    pub temperature: f64,
    pub blood_sugar: i32,
    #[serde(rename = "sugarType")]
    pub blood_sugar_context: BloodSugarContext,
    #[serde(default)]
    pub notes: String,
    pub timestamp: DateTime<Utc>,
}

// ============================================================================
// Metrics
// ============================================================================

/// Rollup metrics derived from the journal.
///
/// Transient: rebuilt from the journal on every query and never persisted.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub today_count: usize,
    pub streak: u32,
    /// Always within 0..=100
    pub health_score: u8,
    pub last_entry_time: Option<DateTime<Utc>>,
}
