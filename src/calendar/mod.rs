pub mod layout;
pub mod navigation;

pub use layout::{layout_week, place_event, DayColumn, PlacedEvent, WeekLayout, WeekWindow};
pub use navigation::CalendarView;
