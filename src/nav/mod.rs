pub mod focus;
pub mod index;
pub mod stars;

pub use focus::{Direction, FocusNavigator};
pub use index::{Filter, NavEntry, NavHeading, NavIndex, NavTarget, ViewLevel};
pub use stars::StarStore;
