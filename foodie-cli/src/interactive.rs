use anyhow::Result;
use foodie_core::{BudgetSpec, CityList, Config, TourError, WeatherFallback, normalize};
use inquire::{InquireError, Password, PasswordDisplayMode, Select, Text, validator::Validation};

const DEFAULT_CITIES: &str = "Delhi, Paris, Tokyo, New York";

/// Ctrl-C / Esc inside a prompt cancels the whole command.
fn cancelled(err: InquireError) -> anyhow::Error {
    match err {
        InquireError::OperationCanceled | InquireError::OperationInterrupted => {
            TourError::UserCancelled.into()
        }
        other => other.into(),
    }
}

pub fn prompt_cities() -> Result<CityList> {
    let answer = Text::new("Which cities should we tour?")
        .with_default(DEFAULT_CITIES)
        .with_help_message("Comma-separated, up to 5")
        .with_validator(|input: &str| {
            Ok(match CityList::parse(input) {
                Ok(_) => Validation::Valid,
                Err(err) => Validation::Invalid(err.to_string().into()),
            })
        })
        .prompt()
        .map_err(cancelled)?;

    Ok(CityList::parse(&answer)?)
}

pub fn prompt_budget() -> Result<BudgetSpec> {
    let answer = Text::new("What's your food budget?")
        .with_default("mid-range")
        .with_help_message("e.g. cheap, mid-range, fancy, luxury, or an amount like $40 per meal")
        .with_validator(|input: &str| {
            Ok(match normalize(input) {
                Some(_) => Validation::Valid,
                None => Validation::Invalid("Try a word like \"cheap\" or an amount like $30".into()),
            })
        })
        .prompt()
        .map_err(cancelled)?;

    Ok(answer.parse::<BudgetSpec>()?)
}

fn prompt_key(label: &str, current: Option<&str>) -> Result<Option<String>> {
    let help = if current.is_some() {
        "Leave empty to keep the stored key"
    } else {
        "Leave empty to set it later via environment variable"
    };

    let key = Password::new(label)
        .without_confirmation()
        .with_display_mode(PasswordDisplayMode::Masked)
        .with_help_message(help)
        .prompt()
        .map_err(cancelled)?;

    let key = key.trim();
    Ok((!key.is_empty()).then(|| key.to_string()))
}

/// Ask for both API keys and the default weather fallback, updating `config`.
pub fn configure(config: &mut Config) -> Result<()> {
    if let Some(key) = prompt_key("OpenWeather API key:", config.weather_api_key())? {
        config.weather.api_key = Some(key);
    }
    if let Some(key) = prompt_key("Julep API key:", config.ai_api_key())? {
        config.ai.api_key = Some(key);
    }

    let options = vec!["depends on mode", WeatherFallback::Abort.as_str(), WeatherFallback::Degrade.as_str()];
    let choice = Select::new("When the weather lookup fails:", options)
        .with_help_message("abort skips the city, degrade continues without weather")
        .prompt()
        .map_err(cancelled)?;

    config.weather_fallback = choice.parse::<WeatherFallback>().ok();
    Ok(())
}
