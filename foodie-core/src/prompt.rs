use std::{collections::BTreeMap, fmt::Write};

use crate::{
    budget::BudgetSpec,
    model::{DISHES_PER_TOUR, MealPlan, MealSlot, WeatherContext},
};

pub const AGENT_NAME: &str = "Foodie Tour Guide";

pub const SYSTEM_PROMPT: &str = "You are a world-class culinary expert, food historian, and \
engaging travel guide. Your goal is to provide accurate, structured data in JSON format when \
asked, and to write captivating, blog-style narratives when prompted for a tour.";

pub fn dishes(city: &str, budget: &BudgetSpec) -> String {
    format!(
        "List exactly {DISHES_PER_TOUR} iconic, must-try local dishes from {city} that are \
         suitable for a {} budget. Focus on authentic, local specialties that represent the \
         city's culinary culture. Provide your answer as a valid JSON array of strings, like \
         [\"Dish A\", \"Dish B\", \"Dish C\"]. Do not include any text outside of the JSON array.",
        budget.prompt_context()
    )
}

pub fn restaurant(city: &str, dish: &str, budget: &BudgetSpec) -> String {
    format!(
        "Find the single best, most highly-rated, and authentic restaurant in {city} that is \
         famous for serving \"{dish}\" and fits a {} budget. Provide your answer as a valid JSON \
         object with four keys: \"name\" (string), \"rating\" (string), \"reason\" (a short \
         string), and \"price_range\" (string). Do not include any text outside of the JSON \
         object.",
        budget.prompt_context()
    )
}

pub fn narrative(
    city: &str,
    weather: &WeatherContext,
    budget: &BudgetSpec,
    meals: &BTreeMap<MealSlot, MealPlan>,
) -> String {
    let mut context = String::new();
    // Writing to a String cannot fail.
    let _ = writeln!(context, "City: {city}");
    let _ = writeln!(context, "Current Weather: {}", weather.summary());
    let _ = writeln!(context, "Dining Suggestion: {}", weather.dining_suggestion());
    let _ = writeln!(context, "Budget: {}", budget.prompt_context());
    let _ = writeln!(context, "\nHere is the itinerary data:");

    for (slot, plan) in meals {
        let price = plan
            .restaurant
            .price_range
            .as_deref()
            .map(|p| format!(" (Price range: {p})"))
            .unwrap_or_default();
        let _ = writeln!(
            context,
            "- {}: We'll be having {} at {}{price}.",
            slot.title(),
            plan.dish,
            plan.restaurant.name
        );
    }

    format!(
        "You are writing a fun, engaging blog post for a one-day foodie tour. Use the context \
         provided below to create a narrative. The tone should be enthusiastic and descriptive. \
         Structure the post with Markdown headings for Breakfast, Lunch, and Dinner. Subtly \
         weave the weather, budget considerations, and the indoor/outdoor dining suggestion into \
         the narrative. Make the descriptions of the food sound delicious and mention value for \
         money when appropriate.\n\n--- CONTEXT ---\n{context}"
    )
}
