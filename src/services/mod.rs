/// Business logic services layer
pub mod approach;
pub mod notify;
pub mod space_weather;
pub mod trend;

pub use approach::{ApproachQuery, ApproachService};
pub use notify::NotificationService;
pub use space_weather::SpaceWeatherService;
