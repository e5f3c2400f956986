// src/model/mod.rs

pub mod summary;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

pub use summary::{dashboard, pricing_table, venue_characteristics};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MembershipType {
    pub name: String,
    pub monthly_price: f64,
    pub annual_price: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PunchPassType {
    /// Leads with the number of classes, e.g. `10 Class Pass`.
    pub name: String,
    pub price: f64,
    /// Fraction, `0.1` = 10%.
    pub discount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Room {
    pub name: String,
    pub capacity: u32,
    pub setup_cost: f64,
    pub maintenance_annual: f64,
}

/// Read-only model parameters shared by every table producer of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelConfig {
    pub model_years: u32,
    pub currency: String,
    pub inflation_rate: f64,
    pub discount_rate: f64,
    #[serde(default)]
    pub membership_types: Vec<MembershipType>,
    #[serde(default)]
    pub punch_pass_types: Vec<PunchPassType>,
    #[serde(default)]
    pub rooms: Vec<Room>,
    pub classes_per_room_per_day: u32,
    pub days_open_per_week: u32,
}

impl ModelConfig {
    pub fn from_yaml(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).context("parsing model configuration")
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading model configuration {}", path.display()))?;
        Self::from_yaml(&text).with_context(|| format!("in {}", path.display()))
    }

    pub fn total_capacity(&self) -> u32 {
        self.rooms.iter().map(|r| r.capacity).sum()
    }

    pub fn classes_per_day(&self) -> u32 {
        self.rooms.len() as u32 * self.classes_per_room_per_day
    }
}
