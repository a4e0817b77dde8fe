mod common;

mod agreements;
mod items;
mod listings;
mod sales;
