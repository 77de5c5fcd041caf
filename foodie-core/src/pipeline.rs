//! Per-city tour generation.
//!
//! Stages run strictly in order and never retry:
//! weather → dishes → one restaurant per meal slot → narrative.
//! A failed dish or restaurant stage ends the city with no tour; a failed
//! narrative still returns the gathered meals. Weather failure either ends the
//! city or degrades to a generic context, depending on [`WeatherFallback`].

use std::{collections::BTreeMap, fmt, str::FromStr};

use anyhow::Context;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    budget::BudgetSpec,
    chat::{AgentId, ChatClient},
    error::TourError,
    extract::extract_json,
    model::{DishList, MealPlan, MealSlot, RestaurantMatch, Stage, TourResult, WeatherContext},
    progress::{ProgressSink, TourEvent},
    prompt,
    provider::WeatherProvider,
};

/// Policy for a failed weather lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeatherFallback {
    /// Skip the city.
    Abort,
    /// Continue with a generic weather context.
    Degrade,
}

impl WeatherFallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherFallback::Abort => "abort",
            WeatherFallback::Degrade => "degrade",
        }
    }
}

impl fmt::Display for WeatherFallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherFallback {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "abort" => Ok(WeatherFallback::Abort),
            "degrade" => Ok(WeatherFallback::Degrade),
            _ => Err(anyhow::anyhow!(
                "Unknown weather fallback '{s}'. Supported values: abort, degrade."
            )),
        }
    }
}

pub struct TourPipeline {
    weather: Box<dyn WeatherProvider>,
    chat: Box<dyn ChatClient>,
    agent: AgentId,
    fallback: WeatherFallback,
}

impl TourPipeline {
    pub fn new(
        weather: Box<dyn WeatherProvider>,
        chat: Box<dyn ChatClient>,
        agent: AgentId,
        fallback: WeatherFallback,
    ) -> Self {
        Self { weather, chat, agent, fallback }
    }

    /// Create the culinary agent on the chat service and build a pipeline around it.
    pub async fn connect(
        weather: Box<dyn WeatherProvider>,
        chat: Box<dyn ChatClient>,
        fallback: WeatherFallback,
    ) -> anyhow::Result<Self> {
        let agent = chat
            .create_agent(prompt::AGENT_NAME, prompt::SYSTEM_PROMPT)
            .await
            .context("Failed to create the culinary agent")?;

        info!(%agent, "culinary agent ready");
        Ok(Self::new(weather, chat, agent, fallback))
    }

    /// Generate the tour for one city.
    pub async fn run(
        &self,
        city: &str,
        budget: &BudgetSpec,
        progress: &dyn ProgressSink,
    ) -> Result<TourResult, TourError> {
        let weather = self.weather_stage(city, progress).await?;
        let dishes = self.dish_stage(city, budget, progress).await?;
        let meals = self.restaurant_stage(city, budget, &dishes, progress).await?;
        let narrative = self.narrative_stage(city, budget, &weather, &meals, progress).await;

        Ok(TourResult {
            city: city.to_string(),
            budget: *budget,
            weather,
            meals,
            narrative,
            generated_at: Utc::now(),
        })
    }

    async fn weather_stage(
        &self,
        city: &str,
        progress: &dyn ProgressSink,
    ) -> Result<WeatherContext, TourError> {
        let stage = Stage::Weather;
        progress.on_event(&TourEvent::StageStarted { city, stage });

        match self.weather.get_weather(city).await {
            Ok(summary) => {
                let context = WeatherContext::Observed(summary);
                info!(city, weather = %context.summary(), "weather resolved");
                progress.on_event(&TourEvent::StageSucceeded {
                    city,
                    stage,
                    detail: format!(
                        "{}. Suggesting {}.",
                        context.summary(),
                        context.dining_suggestion()
                    ),
                });
                Ok(context)
            }
            Err(err) => {
                let error = TourError::upstream(stage, &err);
                match self.fallback {
                    WeatherFallback::Abort => {
                        warn!(city, error = %error, "weather unavailable, skipping city");
                        progress.on_event(&TourEvent::StageFailed { city, stage, error: &error });
                        Err(error)
                    }
                    WeatherFallback::Degrade => {
                        warn!(city, error = %error, "weather unavailable, continuing without it");
                        progress.on_event(&TourEvent::StageDegraded {
                            city,
                            stage,
                            error: &error,
                        });
                        Ok(WeatherContext::Unavailable)
                    }
                }
            }
        }
    }

    async fn dish_stage(
        &self,
        city: &str,
        budget: &BudgetSpec,
        progress: &dyn ProgressSink,
    ) -> Result<DishList, TourError> {
        let stage = Stage::Dishes;
        progress.on_event(&TourEvent::StageStarted { city, stage });

        let result = self.discover_dishes(city, budget).await;
        match &result {
            Ok(dishes) => {
                let listed = dishes.iter().collect::<Vec<_>>().join(", ");
                info!(city, dishes = %listed, "dishes discovered");
                progress.on_event(&TourEvent::StageSucceeded { city, stage, detail: listed });
            }
            Err(error) => {
                warn!(city, error = %error, "dish discovery failed");
                progress.on_event(&TourEvent::StageFailed { city, stage, error });
            }
        }
        result
    }

    async fn discover_dishes(&self, city: &str, budget: &BudgetSpec) -> Result<DishList, TourError> {
        let stage = Stage::Dishes;
        let reply = self.ask(stage, &prompt::dishes(city, budget)).await?;
        let candidates: Vec<String> = parse_json(stage, &reply)?;
        DishList::from_candidates(candidates)
    }

    async fn restaurant_stage(
        &self,
        city: &str,
        budget: &BudgetSpec,
        dishes: &DishList,
        progress: &dyn ProgressSink,
    ) -> Result<BTreeMap<MealSlot, MealPlan>, TourError> {
        let stage = Stage::Restaurants;
        progress.on_event(&TourEvent::StageStarted { city, stage });

        let mut meals = BTreeMap::new();
        for &slot in MealSlot::all() {
            let dish = dishes.get(slot);
            progress.on_event(&TourEvent::MealLookup { city, slot, dish });

            let restaurant = match self.find_restaurant(city, dish, budget).await {
                Ok(restaurant) => restaurant,
                Err(error) => {
                    warn!(city, %slot, dish, error = %error, "restaurant lookup failed, skipping city");
                    progress.on_event(&TourEvent::StageFailed { city, stage, error: &error });
                    return Err(error);
                }
            };

            info!(city, %slot, dish, restaurant = %restaurant.name, "restaurant matched");
            progress.on_event(&TourEvent::MealMatched { city, slot, restaurant: &restaurant });
            meals.insert(slot, MealPlan { dish: dish.to_string(), restaurant });
        }

        progress.on_event(&TourEvent::StageSucceeded {
            city,
            stage,
            detail: format!("{} restaurants matched", meals.len()),
        });
        Ok(meals)
    }

    async fn find_restaurant(
        &self,
        city: &str,
        dish: &str,
        budget: &BudgetSpec,
    ) -> Result<RestaurantMatch, TourError> {
        let stage = Stage::Restaurants;
        let reply = self.ask(stage, &prompt::restaurant(city, dish, budget)).await?;
        let restaurant: RestaurantMatch = parse_json(stage, &reply)?;

        if restaurant.name.trim().is_empty() {
            return Err(TourError::malformed(stage, format!("empty restaurant name for {dish}")));
        }
        Ok(restaurant)
    }

    async fn narrative_stage(
        &self,
        city: &str,
        budget: &BudgetSpec,
        weather: &WeatherContext,
        meals: &BTreeMap<MealSlot, MealPlan>,
        progress: &dyn ProgressSink,
    ) -> Option<String> {
        let stage = Stage::Narrative;
        progress.on_event(&TourEvent::StageStarted { city, stage });

        let prompt = prompt::narrative(city, weather, budget, meals);
        let result = match self.ask(stage, &prompt).await {
            Ok(text) if text.trim().is_empty() => {
                Err(TourError::malformed(stage, "empty narrative"))
            }
            other => other,
        };

        match result {
            Ok(text) => {
                let words = text.split_whitespace().count();
                info!(city, words, "narrative generated");
                progress.on_event(&TourEvent::StageSucceeded {
                    city,
                    stage,
                    detail: format!("{words} words"),
                });
                Some(text.trim().to_string())
            }
            Err(error) => {
                warn!(city, error = %error, "narrative generation failed");
                progress.on_event(&TourEvent::StageFailed { city, stage, error: &error });
                None
            }
        }
    }

    async fn ask(&self, stage: Stage, prompt: &str) -> Result<String, TourError> {
        self.chat
            .chat(&self.agent, prompt)
            .await
            .map_err(|err| TourError::upstream(stage, &err))
    }
}

fn parse_json<T: serde::de::DeserializeOwned>(stage: Stage, reply: &str) -> Result<T, TourError> {
    let json = extract_json(reply)
        .ok_or_else(|| TourError::malformed(stage, "no JSON found in reply"))?;

    serde_json::from_str(json).map_err(|err| {
        warn!(%stage, raw = reply, "unparsable JSON in reply");
        TourError::malformed(stage, err.to_string())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        FakeWeather, RecordingProgress, ScriptedChat, dishes_reply, restaurant_reply,
    };

    fn pipeline(
        weather: FakeWeather,
        chat: &ScriptedChat,
        fallback: WeatherFallback,
    ) -> TourPipeline {
        TourPipeline::new(Box::new(weather), Box::new(chat.clone()), AgentId::new("agent"), fallback)
    }

    fn full_script() -> Vec<Result<String, String>> {
        vec![
            Ok(dishes_reply(&["Croissant", "Croque Monsieur", "Boeuf Bourguignon"])),
            Ok(restaurant_reply("Du Pain et des Idées")),
            Ok(format!("Sure thing!\n```json\n{}\n```", restaurant_reply("Café de Flore"))),
            Ok(restaurant_reply("Le Train Bleu")),
            Ok("## Breakfast\nFlaky joy.\n## Lunch\n...\n## Dinner\n...".to_string()),
        ]
    }

    #[tokio::test]
    async fn full_tour_has_three_meals_and_narrative() {
        let chat = ScriptedChat::new(full_script());
        let p = pipeline(FakeWeather::sunny(&["Paris"]), &chat, WeatherFallback::Abort);
        let progress = RecordingProgress::default();

        let tour = p.run("Paris", &BudgetSpec::default(), &progress).await.unwrap();

        assert!(tour.is_complete());
        assert_eq!(tour.meals.len(), 3);
        assert_eq!(tour.meal(MealSlot::Lunch).unwrap().restaurant.name, "Café de Flore");
        assert_eq!(tour.meal(MealSlot::Dinner).unwrap().dish, "Boeuf Bourguignon");
        assert!(tour.narrative.as_deref().is_some_and(|n| n.contains("## Dinner")));
        assert!(matches!(tour.weather, WeatherContext::Observed(_)));
        assert_eq!(chat.prompts().len(), 5);
        assert!(progress.events().iter().any(|e| e == "succeeded:Paris:narrative"));
    }

    #[tokio::test]
    async fn prompts_follow_slot_order_and_budget() {
        let chat = ScriptedChat::new(full_script());
        let p = pipeline(FakeWeather::sunny(&["Paris"]), &chat, WeatherFallback::Abort);

        p.run("Paris", &BudgetSpec::Numeric(10), &RecordingProgress::default()).await.unwrap();

        let prompts = chat.prompts();
        assert!(prompts[0].contains("from Paris"));
        assert!(prompts[0].contains("about $10 per meal"));
        assert!(prompts[1].contains("\"Croissant\""));
        assert!(prompts[2].contains("\"Croque Monsieur\""));
        assert!(prompts[3].contains("\"Boeuf Bourguignon\""));
        assert!(prompts[4].contains("- Breakfast: We'll be having Croissant at Du Pain et des Idées"));
    }

    #[tokio::test]
    async fn two_dishes_fail_the_city() {
        let chat = ScriptedChat::new(vec![Ok(dishes_reply(&["Pho", "Banh Mi"]))]);
        let p = pipeline(FakeWeather::sunny(&["Hanoi"]), &chat, WeatherFallback::Abort);

        let err = p.run("Hanoi", &BudgetSpec::default(), &RecordingProgress::default()).await.unwrap_err();

        assert!(matches!(err, TourError::MalformedResponse { stage: Stage::Dishes, .. }));
        assert_eq!(chat.prompts().len(), 1);
    }

    #[tokio::test]
    async fn unparsable_dishes_fail_the_city() {
        let chat = ScriptedChat::new(vec![Ok("I recommend pho, banh mi and bun cha.".into())]);
        let p = pipeline(FakeWeather::sunny(&["Hanoi"]), &chat, WeatherFallback::Abort);

        let err = p.run("Hanoi", &BudgetSpec::default(), &RecordingProgress::default()).await.unwrap_err();
        assert!(err.to_string().contains("no JSON found"));
    }

    #[tokio::test]
    async fn restaurant_failure_at_second_slot_stops_the_city() {
        let chat = ScriptedChat::new(vec![
            Ok(dishes_reply(&["Pho", "Banh Mi", "Bun Cha"])),
            Ok(restaurant_reply("Pho Gia Truyen")),
            Err("upstream timeout".into()),
            Ok(restaurant_reply("Never Asked")),
        ]);
        let p = pipeline(FakeWeather::sunny(&["Hanoi"]), &chat, WeatherFallback::Abort);
        let progress = RecordingProgress::default();

        let err = p.run("Hanoi", &BudgetSpec::default(), &progress).await.unwrap_err();

        assert!(matches!(err, TourError::UpstreamUnavailable { stage: Stage::Restaurants, .. }));
        let prompts = chat.prompts();
        assert_eq!(prompts.len(), 3);
        assert!(prompts.iter().all(|p| !p.contains("\"Bun Cha\"")));
        assert!(!progress.events().iter().any(|e| e.starts_with("tour:")));
    }

    #[tokio::test]
    async fn malformed_restaurant_fails_the_city() {
        let chat = ScriptedChat::new(vec![
            Ok(dishes_reply(&["Pho", "Banh Mi", "Bun Cha"])),
            Ok(r#"{"name": "Somewhere"}"#.into()),
        ]);
        let p = pipeline(FakeWeather::sunny(&["Hanoi"]), &chat, WeatherFallback::Abort);

        let err = p.run("Hanoi", &BudgetSpec::default(), &RecordingProgress::default()).await.unwrap_err();
        assert!(matches!(err, TourError::MalformedResponse { stage: Stage::Restaurants, .. }));
    }

    #[tokio::test]
    async fn narrative_failure_keeps_meals() {
        let mut script = full_script();
        script[4] = Err("rate limited".into());
        let chat = ScriptedChat::new(script);
        let p = pipeline(FakeWeather::sunny(&["Paris"]), &chat, WeatherFallback::Abort);
        let progress = RecordingProgress::default();

        let tour = p.run("Paris", &BudgetSpec::default(), &progress).await.unwrap();

        assert!(tour.is_complete());
        assert_eq!(tour.narrative, None);
        assert!(progress.events().iter().any(|e| e == "failed:Paris:narrative"));
    }

    #[tokio::test]
    async fn weather_failure_aborts_in_abort_mode() {
        let chat = ScriptedChat::new(full_script());
        let p = pipeline(FakeWeather::sunny(&[]), &chat, WeatherFallback::Abort);

        let err = p.run("Paris", &BudgetSpec::default(), &RecordingProgress::default()).await.unwrap_err();

        assert!(matches!(err, TourError::UpstreamUnavailable { stage: Stage::Weather, .. }));
        assert!(chat.prompts().is_empty());
    }

    #[tokio::test]
    async fn weather_failure_degrades_in_degrade_mode() {
        let chat = ScriptedChat::new(full_script());
        let p = pipeline(FakeWeather::sunny(&[]), &chat, WeatherFallback::Degrade);
        let progress = RecordingProgress::default();

        let tour = p.run("Paris", &BudgetSpec::default(), &progress).await.unwrap();

        assert_eq!(tour.weather, WeatherContext::Unavailable);
        assert!(tour.is_complete());
        assert!(progress.events().iter().any(|e| e == "degraded:Paris:weather"));
        assert!(chat.prompts()[4].contains("Current Weather: Unknown (weather data unavailable)"));
    }

    #[tokio::test]
    async fn connect_creates_the_agent() {
        let chat = ScriptedChat::new(vec![]);
        let p = TourPipeline::connect(
            Box::new(FakeWeather::sunny(&[])),
            Box::new(chat.clone()),
            WeatherFallback::Degrade,
        )
        .await
        .unwrap();

        assert_eq!(p.fallback, WeatherFallback::Degrade);
        assert_eq!(chat.agents(), vec![prompt::AGENT_NAME.to_string()]);
    }

    #[test]
    fn weather_fallback_parses() {
        assert_eq!("Degrade".parse::<WeatherFallback>().unwrap(), WeatherFallback::Degrade);
        assert_eq!(" abort ".parse::<WeatherFallback>().unwrap(), WeatherFallback::Abort);
        let err = "ignore".parse::<WeatherFallback>().unwrap_err();
        assert!(err.to_string().contains("Unknown weather fallback"));
    }
}
