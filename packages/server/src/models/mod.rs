pub mod agreement;
pub mod artisan;
pub mod item;
pub mod listing;
pub mod operator;
pub mod sale;
pub mod shared;
