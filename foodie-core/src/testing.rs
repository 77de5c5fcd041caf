use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::Utc;

use crate::{
    chat::{AgentId, ChatClient},
    model::WeatherSummary,
    progress::{ProgressSink, TourEvent},
    provider::WeatherProvider,
};

/// Returns clear skies for the listed cities and an error for any other.
#[derive(Debug, Clone)]
pub struct FakeWeather {
    cities: Vec<String>,
}

impl FakeWeather {
    pub fn sunny(cities: &[&str]) -> Self {
        Self { cities: cities.iter().map(|c| c.to_string()).collect() }
    }
}

#[async_trait]
impl WeatherProvider for FakeWeather {
    async fn get_weather(&self, city: &str) -> Result<WeatherSummary> {
        if !self.cities.iter().any(|c| c == city) {
            return Err(anyhow!("city not found: {city}"));
        }
        Ok(WeatherSummary {
            location_name: city.to_string(),
            condition: "Clear".to_string(),
            temperature_c: 22.0,
            observed_at: Utc::now(),
        })
    }
}

#[derive(Debug, Default)]
struct Script {
    replies: VecDeque<Result<String, String>>,
    prompts: Vec<String>,
    agents: Vec<String>,
}

/// Answers chats from a fixed queue of replies and records every prompt.
#[derive(Debug, Clone, Default)]
pub struct ScriptedChat {
    script: Arc<Mutex<Script>>,
}

impl ScriptedChat {
    pub fn new(replies: Vec<Result<String, String>>) -> Self {
        let script = Script { replies: replies.into(), ..Script::default() };
        Self { script: Arc::new(Mutex::new(script)) }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.script.lock().unwrap().prompts.clone()
    }

    pub fn agents(&self) -> Vec<String> {
        self.script.lock().unwrap().agents.clone()
    }
}

#[async_trait]
impl ChatClient for ScriptedChat {
    async fn create_agent(&self, name: &str, _system_prompt: &str) -> Result<AgentId> {
        self.script.lock().unwrap().agents.push(name.to_string());
        Ok(AgentId::new("agent-test"))
    }

    async fn chat(&self, _agent: &AgentId, prompt: &str) -> Result<String> {
        let mut script = self.script.lock().unwrap();
        script.prompts.push(prompt.to_string());
        match script.replies.pop_front() {
            Some(Ok(reply)) => Ok(reply),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Err(anyhow!("no scripted reply left")),
        }
    }
}

/// Flattens events into `kind:city[:stage]` strings.
#[derive(Debug, Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn events(&self) -> Vec<String> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingProgress {
    fn on_event(&self, event: &TourEvent<'_>) {
        let line = match event {
            TourEvent::CityStarted { city, .. } => format!("city:{city}"),
            TourEvent::StageStarted { city, stage } => format!("started:{city}:{stage}"),
            TourEvent::StageSucceeded { city, stage, .. } => format!("succeeded:{city}:{stage}"),
            TourEvent::StageDegraded { city, stage, .. } => format!("degraded:{city}:{stage}"),
            TourEvent::StageFailed { city, stage, .. } => format!("failed:{city}:{stage}"),
            TourEvent::MealLookup { city, slot, .. } => format!("lookup:{city}:{slot}"),
            TourEvent::MealMatched { city, slot, .. } => format!("matched:{city}:{slot}"),
            TourEvent::TourReady { tour } => format!("tour:{}", tour.city),
            TourEvent::CityFailed { city, .. } => format!("city-failed:{city}"),
        };
        self.events.lock().unwrap().push(line);
    }
}

pub fn dishes_reply(dishes: &[&str]) -> String {
    format!("Here are the dishes: {}", serde_json::to_string(dishes).unwrap())
}

pub fn restaurant_reply(name: &str) -> String {
    serde_json::json!({
        "name": name,
        "rating": "4.7",
        "reason": "Locals queue for it",
        "price_range": "$$"
    })
    .to_string()
}
