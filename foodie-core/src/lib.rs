//! Core library for the `foodie` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Budget phrase normalization and JSON extraction from model replies
//! - Weather and AI chat clients behind small traits
//! - The per-city tour pipeline and the driver that runs it over a city list
//!
//! It is used by `foodie-cli`, but does no rendering of its own: progress is
//! reported through [`ProgressSink`].

pub mod budget;
pub mod chat;
pub mod config;
pub mod driver;
pub mod error;
pub mod extract;
mod http;
pub mod model;
pub mod pipeline;
pub mod progress;
pub mod prompt;
pub mod provider;

#[cfg(test)]
mod testing;

pub use budget::{BudgetSpec, Tier, normalize};
pub use chat::{AgentId, ChatClient};
pub use config::{Config, Credentials};
pub use driver::{RunOutcome, RunReport, TourDriver};
pub use error::TourError;
pub use extract::extract_json;
pub use model::{CityList, MealPlan, MealSlot, RestaurantMatch, Stage, TourResult, WeatherContext, WeatherSummary};
pub use pipeline::{TourPipeline, WeatherFallback};
pub use progress::{ProgressSink, TourEvent};
pub use provider::WeatherProvider;
