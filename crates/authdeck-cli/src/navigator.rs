use authdeck_core::{Navigator, Route};
use tracing::info;

/// Stands in for a browser router: reports where the user would be sent.
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn navigate(&self, route: Route) {
        info!(route = %route, "Navigating");
        println!("-> {}", route);
    }
}
