//! Entity module - Contains all SeaORM entity definitions for the database.
//! Ledger entities are written by the bookkeeping layer and only read here;
//! `team_performance` and `seat_value_prediction` are derived and owned by the core.

pub mod attendance;
pub mod game;
pub mod game_pricing;
pub mod owner;
pub mod payment;
pub mod season;
pub mod seat;
pub mod seat_ownership;
pub mod seat_value_prediction;
pub mod team;
pub mod team_performance;

// Re-export specific types to avoid conflicts
pub use attendance::{Entity as Attendance, Model as AttendanceModel};
pub use game::{Column as GameColumn, Entity as Game, Model as GameModel};
pub use game_pricing::{
    Column as GamePricingColumn, Entity as GamePricing, Model as GamePricingModel,
};
pub use owner::{Entity as Owner, Model as OwnerModel};
pub use payment::{Column as PaymentColumn, Entity as Payment, Model as PaymentModel};
pub use season::{Column as SeasonColumn, Entity as Season, Model as SeasonModel};
pub use seat::{Column as SeatColumn, Entity as Seat, Model as SeatModel};
pub use seat_ownership::{
    Column as SeatOwnershipColumn, Entity as SeatOwnership, Model as SeatOwnershipModel,
};
pub use seat_value_prediction::{
    Column as SeatValuePredictionColumn, Entity as SeatValuePrediction,
    Model as SeatValuePredictionModel,
};
pub use team::{Entity as Team, Model as TeamModel};
pub use team_performance::{
    Column as TeamPerformanceColumn, Entity as TeamPerformance, Model as TeamPerformanceModel,
};
