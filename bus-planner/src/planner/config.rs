//! Search configuration for the itinerary planner.

/// Configuration parameters for itinerary search.
#[derive(Debug, Clone)]
pub struct SearchConfig {
    /// Radius around origin and destination searched for stops (metres).
    pub nearby_radius_m: f64,

    /// Maximum number of stops kept per endpoint.
    pub nearby_limit: usize,

    /// Maximum walk between the two stops of a transfer pair (metres).
    pub hub_walk_radius_m: f64,

    /// Walking speed used to time transfer walks (metres per second).
    pub walking_speed_mps: f64,

    /// Minimum time between first-leg arrival and second-leg departure.
    pub min_transfer_secs: i64,

    /// Maximum time between first-leg arrival and second-leg departure.
    pub max_transfer_secs: i64,

    /// Maximum number of itineraries to return.
    pub max_results: usize,

    /// Maximum number of transfer hubs with a usable first leg explored.
    /// Hubs whose origin route does not run in the window are not counted.
    pub max_hubs: usize,

    /// Search window when the request does not give one (minutes).
    pub default_window_mins: i64,

    /// Windows starting before this (seconds after midnight) also look at
    /// the previous service day.
    pub early_morning_cutoff_secs: i64,
}

impl SearchConfig {
    /// Returns the default window in seconds.
    pub fn default_window_secs(&self) -> i64 {
        self.default_window_mins * 60
    }

    /// Seconds needed to walk `distance_m` at the configured speed.
    pub fn walk_secs(&self, distance_m: f64) -> i64 {
        if distance_m <= 0.0 || self.walking_speed_mps <= 0.0 {
            return 0;
        }
        (distance_m / self.walking_speed_mps).ceil() as i64
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            nearby_radius_m: 600.0,
            nearby_limit: 15,
            hub_walk_radius_m: 300.0,
            walking_speed_mps: 1.35,
            min_transfer_secs: 180,
            max_transfer_secs: 2_400,
            max_results: 6,
            max_hubs: 20,
            default_window_mins: 240, // 4 hours
            early_morning_cutoff_secs: 18_000, // 05:00
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = SearchConfig::default();

        assert_eq!(config.nearby_radius_m, 600.0);
        assert_eq!(config.nearby_limit, 15);
        assert_eq!(config.hub_walk_radius_m, 300.0);
        assert_eq!(config.min_transfer_secs, 180);
        assert_eq!(config.max_transfer_secs, 2_400);
        assert_eq!(config.max_results, 6);
        assert_eq!(config.max_hubs, 20);
        assert_eq!(config.early_morning_cutoff_secs, 5 * 3_600);
    }

    #[test]
    fn duration_methods() {
        let config = SearchConfig::default();

        assert_eq!(config.default_window_secs(), 4 * 3_600);
        assert_eq!(config.walk_secs(0.0), 0);
        assert_eq!(config.walk_secs(135.0), 100);
        assert_eq!(config.walk_secs(136.0), 101);
    }

    #[test]
    fn custom_config() {
        let config = SearchConfig {
            max_results: 3,
            walking_speed_mps: 0.0,
            ..SearchConfig::default()
        };

        assert_eq!(config.max_results, 3);
        assert_eq!(config.walk_secs(200.0), 0);
    }
}
