use std::{collections::BTreeMap, fmt};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::warn;

use crate::{budget::BudgetSpec, error::TourError};

/// Upper bound on cities handled in one run.
pub const MAX_CITIES: usize = 5;

/// Number of dishes a tour needs, one per meal slot.
pub const DISHES_PER_TOUR: usize = 3;

/// One sequential step of a city's tour generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Weather,
    Dishes,
    Restaurants,
    Narrative,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Weather => "weather",
            Stage::Dishes => "dishes",
            Stage::Restaurants => "restaurants",
            Stage::Narrative => "narrative",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fixed, ordered meal positions. Slot `i` consumes dish `i`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MealSlot {
    Breakfast,
    Lunch,
    Dinner,
}

impl MealSlot {
    pub const fn all() -> &'static [MealSlot; DISHES_PER_TOUR] {
        &[MealSlot::Breakfast, MealSlot::Lunch, MealSlot::Dinner]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "breakfast",
            MealSlot::Lunch => "lunch",
            MealSlot::Dinner => "dinner",
        }
    }

    /// Capitalised form used in prompts and headings.
    pub fn title(&self) -> &'static str {
        match self {
            MealSlot::Breakfast => "Breakfast",
            MealSlot::Lunch => "Lunch",
            MealSlot::Dinner => "Dinner",
        }
    }
}

impl fmt::Display for MealSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current conditions for a city, as reported by a weather provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub location_name: String,
    pub condition: String,
    pub temperature_c: f64,
    pub observed_at: DateTime<Utc>,
}

/// Weather information available to the rest of the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum WeatherContext {
    Observed(WeatherSummary),
    /// Lookup failed and the run degrades instead of aborting.
    Unavailable,
}

impl WeatherContext {
    /// Short human-readable form, e.g. `Clear, 21.5°C`.
    pub fn summary(&self) -> String {
        match self {
            WeatherContext::Observed(w) => format!("{}, {:.1}°C", w.condition, w.temperature_c),
            WeatherContext::Unavailable => "Unknown (weather data unavailable)".to_string(),
        }
    }

    pub fn dining_suggestion(&self) -> &'static str {
        match self {
            WeatherContext::Observed(w)
                if w.temperature_c < 15.0 || w.condition.to_lowercase().contains("rain") =>
            {
                "cozy indoor dining"
            }
            WeatherContext::Observed(_) => "delightful outdoor dining",
            WeatherContext::Unavailable => "flexible indoor or outdoor dining",
        }
    }
}

/// Exactly three distinct dish names, in meal-slot order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DishList(Vec<String>);

impl DishList {
    /// Build from raw AI output. Blank and repeated (case-insensitive) names are
    /// dropped, extra dishes beyond three are ignored.
    pub fn from_candidates<I>(candidates: I) -> Result<Self, TourError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut dishes: Vec<String> = Vec::with_capacity(DISHES_PER_TOUR);

        for candidate in candidates {
            let dish = candidate.trim();
            if dish.is_empty() || dishes.iter().any(|d| d.eq_ignore_ascii_case(dish)) {
                continue;
            }
            dishes.push(dish.to_string());
        }

        if dishes.len() < DISHES_PER_TOUR {
            return Err(TourError::malformed(
                Stage::Dishes,
                format!(
                    "expected {DISHES_PER_TOUR} distinct dishes, got {}",
                    dishes.len()
                ),
            ));
        }

        dishes.truncate(DISHES_PER_TOUR);
        Ok(Self(dishes))
    }

    pub fn get(&self, slot: MealSlot) -> &str {
        &self.0[slot as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

/// A single recommended restaurant for one meal slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RestaurantMatch {
    pub name: String,
    #[serde(deserialize_with = "string_or_number")]
    pub rating: String,
    pub reason: String,
    #[serde(default, alias = "priceRange", skip_serializing_if = "Option::is_none")]
    pub price_range: Option<String>,
}

/// Models are asked for a string rating but often answer `4.7`.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MealPlan {
    pub dish: String,
    pub restaurant: RestaurantMatch,
}

/// The assembled tour for one city.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TourResult {
    pub city: String,
    pub budget: BudgetSpec,
    pub weather: WeatherContext,
    pub meals: BTreeMap<MealSlot, MealPlan>,
    pub narrative: Option<String>,
    pub generated_at: DateTime<Utc>,
}

impl TourResult {
    pub fn meal(&self, slot: MealSlot) -> Option<&MealPlan> {
        self.meals.get(&slot)
    }

    pub fn is_complete(&self) -> bool {
        MealSlot::all().iter().all(|slot| self.meals.contains_key(slot))
    }
}

/// Ordered, de-duplicated list of cities to tour.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CityList(Vec<String>);

impl CityList {
    /// Trims names, drops blanks and case-insensitive repeats (first spelling
    /// wins), and keeps at most [`MAX_CITIES`].
    pub fn new<I, S>(cities: I) -> Result<Self, TourError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();

        for city in cities {
            let city = city.as_ref().trim();
            if city.is_empty() || list.iter().any(|c| c.to_lowercase() == city.to_lowercase()) {
                continue;
            }
            list.push(city.to_string());
        }

        if list.is_empty() {
            return Err(TourError::invalid_input("at least one city is required"));
        }

        if list.len() > MAX_CITIES {
            warn!(
                dropped = ?&list[MAX_CITIES..],
                "more than {MAX_CITIES} cities given, keeping the first {MAX_CITIES}"
            );
            list.truncate(MAX_CITIES);
        }

        Ok(Self(list))
    }

    /// Parse a comma-separated list such as `"Delhi, Paris,Tokyo"`.
    pub fn parse(raw: &str) -> Result<Self, TourError> {
        Self::new(raw.split(','))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}
