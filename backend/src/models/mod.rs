pub mod history;
pub mod intent;
pub mod itinerary;

pub use history::*;
pub use intent::*;
pub use itinerary::*;
