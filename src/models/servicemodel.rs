use serde::{Deserialize, Serialize};
use sqlx::types::BigDecimal;
use uuid::Uuid;

pub const AVAILABILITY_BUSY: &str = "Busy with a job";
pub const AVAILABILITY_AVAILABLE: &str = "Available now";

/// A provider's listing in the service catalog.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone)]
pub struct Service {
    pub id: Uuid,
    pub name: String,
    pub category: String,
    pub rate_per_hour: BigDecimal,
    pub availability: String,
    pub ratings_sum: i64,
    pub reviews: i64,
    pub rating: f64,
}

impl Service {
    /// Folds one 1-5 star rating into the running aggregate.
    pub fn record_rating(&mut self, value: i32) {
        self.ratings_sum += i64::from(value);
        self.reviews += 1;
        self.rating = self.mean_rating();
    }

    pub fn mean_rating(&self) -> f64 {
        if self.reviews == 0 {
            0.0
        } else {
            self.ratings_sum as f64 / self.reviews as f64
        }
    }
}
