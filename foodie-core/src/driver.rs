use std::future::Future;

use tracing::{info, warn};

use crate::{
    budget::BudgetSpec,
    error::TourError,
    model::{CityList, TourResult},
    pipeline::TourPipeline,
    progress::{ProgressSink, TourEvent},
};

/// How a run ended overall.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    AllSucceeded,
    Partial,
    NoneSucceeded,
    /// Interrupted before every city was processed.
    Cancelled,
}

#[derive(Debug, Default)]
pub struct RunReport {
    pub total: usize,
    pub tours: Vec<TourResult>,
    pub failures: Vec<(String, TourError)>,
    pub cancelled: bool,
}

impl RunReport {
    pub fn succeeded(&self) -> usize {
        self.tours.len()
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn outcome(&self) -> RunOutcome {
        if self.cancelled {
            RunOutcome::Cancelled
        } else if self.succeeded() == self.total {
            RunOutcome::AllSucceeded
        } else if self.succeeded() == 0 {
            RunOutcome::NoneSucceeded
        } else {
            RunOutcome::Partial
        }
    }
}

/// Runs the pipeline over every requested city, one at a time.
pub struct TourDriver {
    pipeline: TourPipeline,
}

impl TourDriver {
    pub fn new(pipeline: TourPipeline) -> Self {
        Self { pipeline }
    }

    /// Process `cities` in order until done or until `shutdown` resolves.
    ///
    /// A city failure is recorded and the run moves on. When `shutdown`
    /// resolves the in-flight city is dropped mid-stage and the run stops.
    pub async fn run<S>(
        &self,
        cities: &CityList,
        budget: &BudgetSpec,
        progress: &dyn ProgressSink,
        shutdown: S,
    ) -> RunReport
    where
        S: Future<Output = ()>,
    {
        let mut report = RunReport { total: cities.len(), ..RunReport::default() };
        tokio::pin!(shutdown);

        for (index, city) in cities.iter().enumerate() {
            progress.on_event(&TourEvent::CityStarted { city, index, total: report.total });

            let result = tokio::select! {
                biased;
                _ = &mut shutdown => None,
                result = self.pipeline.run(city, budget, progress) => Some(result),
            };

            match result {
                None => {
                    warn!(city, completed = index, "run interrupted");
                    let error = TourError::UserCancelled;
                    progress.on_event(&TourEvent::CityFailed { city, error: &error });
                    report.cancelled = true;
                    break;
                }
                Some(Ok(tour)) => {
                    progress.on_event(&TourEvent::TourReady { tour: &tour });
                    report.tours.push(tour);
                }
                Some(Err(error)) => {
                    warn!(city, stage = ?error.stage(), error = %error, "no tour for city");
                    progress.on_event(&TourEvent::CityFailed { city, error: &error });
                    report.failures.push((city.to_string(), error));
                }
            }
        }

        info!(
            total = report.total,
            succeeded = report.succeeded(),
            failed = report.failed(),
            cancelled = report.cancelled,
            "run finished"
        );
        report
    }
}
