pub mod admin_operator;
pub mod agreement_document;
pub mod artisan;
pub mod handcrafted_item;
pub mod platform_listing;
pub mod sale;
