use crate::{
    error::TourError,
    model::{MealSlot, RestaurantMatch, Stage, TourResult},
};

#[derive(Debug)]
pub enum TourEvent<'a> {
    /// `index` is zero-based.
    CityStarted { city: &'a str, index: usize, total: usize },
    StageStarted { city: &'a str, stage: Stage },
    StageSucceeded { city: &'a str, stage: Stage, detail: String },
    /// The stage failed but the tour continues without its data.
    StageDegraded { city: &'a str, stage: Stage, error: &'a TourError },
    StageFailed { city: &'a str, stage: Stage, error: &'a TourError },
    MealLookup { city: &'a str, slot: MealSlot, dish: &'a str },
    MealMatched { city: &'a str, slot: MealSlot, restaurant: &'a RestaurantMatch },
    TourReady { tour: &'a TourResult },
    CityFailed { city: &'a str, error: &'a TourError },
}

/// Receives events in the order work happens. The core never prints itself.
pub trait ProgressSink: Send + Sync {
    fn on_event(&self, event: &TourEvent<'_>);
}
