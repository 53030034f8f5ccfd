pub mod dashboard;
pub mod google;
pub mod health;
pub mod integrations;
pub mod root;
