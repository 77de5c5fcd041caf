use std::fmt::Write;

use chrono::Local;
use foodie_core::{MealSlot, ProgressSink, RunReport, Stage, TourEvent, TourResult};

const RULE: &str = "================================================================================";

/// Prints progress as it happens. With `json` set, everything goes to stderr so
/// stdout carries only the JSON document.
#[derive(Debug, Clone, Copy)]
pub struct ConsoleProgress {
    json: bool,
}

impl ConsoleProgress {
    pub fn new(json: bool) -> Self {
        Self { json }
    }

    pub fn line(&self, text: &str) {
        if self.json {
            eprintln!("{text}");
        } else {
            println!("{text}");
        }
    }

    pub fn summary(&self, report: &RunReport) {
        self.line(&render_summary(report));
    }
}

impl ProgressSink for ConsoleProgress {
    fn on_event(&self, event: &TourEvent<'_>) {
        let text = match event {
            TourEvent::CityStarted { city, index, total } => format!(
                "\n[{}/{}] Generating foodie tour for {}\n",
                index + 1,
                total,
                city.to_uppercase()
            ),
            TourEvent::StageStarted { city, stage } => match stage {
                Stage::Weather => format!("Checking weather for {city}..."),
                Stage::Dishes => format!("Finding iconic dishes in {city}..."),
                Stage::Narrative => "Generating the final tour narrative...".to_string(),
                Stage::Restaurants => return,
            },
            TourEvent::StageSucceeded { stage, detail, .. } => match stage {
                Stage::Weather => format!("  Weather is {detail}"),
                Stage::Dishes => format!("  Found dishes: {detail}"),
                Stage::Restaurants | Stage::Narrative => return,
            },
            TourEvent::StageDegraded { city, error, .. } => {
                format!("  Could not get weather for {city} ({error}). Continuing without it.")
            }
            TourEvent::StageFailed { city, stage, error } => {
                format!("  The {stage} step failed for {city}: {error}")
            }
            TourEvent::MealLookup { slot, dish, .. } => {
                format!("Finding a restaurant for {} ({dish})...", slot.title())
            }
            TourEvent::MealMatched { restaurant, .. } => format!("  Found: {}", restaurant.name),
            TourEvent::TourReady { tour } => {
                if self.json {
                    return;
                }
                render_tour(tour)
            }
            TourEvent::CityFailed { city, error } => format!("Skipping {city}: {error}"),
        };

        self.line(&text);
    }
}

/// Render a finished tour: itinerary first, then the narrative or a notice.
pub fn render_tour(tour: &TourResult) -> String {
    let mut out = String::new();
    let date = tour.generated_at.with_timezone(&Local).format("%A, %-d %B %Y");

    // Writing to a String cannot fail.
    let _ = writeln!(out, "\n{RULE}");
    let _ = writeln!(out, "Your One-Day Foodie Tour in {}", tour.city.to_uppercase());
    let _ = writeln!(out, "{date}");
    let _ = writeln!(out, "{RULE}\n");
    let _ = writeln!(out, "Weather: {} ({})", tour.weather.summary(), tour.weather.dining_suggestion());
    let _ = writeln!(out, "Budget:  {}\n", tour.budget);

    for slot in MealSlot::all() {
        let Some(plan) = tour.meal(*slot) else { continue };
        let r = &plan.restaurant;
        let price = r.price_range.as_deref().map(|p| format!(", {p}")).unwrap_or_default();
        let _ = writeln!(out, "{:<10} {} at {} (rated {}{price})", slot.title(), plan.dish, r.name, r.rating);
        let _ = writeln!(out, "{:<10} {}", "", r.reason);
    }
    out.push('\n');

    match &tour.narrative {
        Some(narrative) => {
            let _ = writeln!(out, "{narrative}");
        }
        None => {
            let _ = writeln!(out, "Sorry, we couldn't generate the tour narrative at this time.");
        }
    }

    let _ = write!(out, "\n{RULE}");
    out
}

pub fn render_summary(report: &RunReport) -> String {
    let mut out = format!(
        "\nGenerated {} of {} tour(s).",
        report.succeeded(),
        report.total
    );

    for (city, error) in &report.failures {
        let _ = write!(out, "\n  {city}: {error}");
    }
    if report.cancelled {
        out.push_str("\nRun interrupted; remaining cities were skipped.");
    }
    out
}
