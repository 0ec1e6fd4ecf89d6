pub mod clock;
pub mod inventory;
pub mod live;
pub mod services;
pub mod utils;

pub use clock::{Clock, FixedClock, SystemClock};
pub use inventory::Inventory;
pub use live::DashboardFeed;
