pub mod auth;
pub mod label;
pub mod recipe;

pub use auth::AuthService;
pub use label::LabelService;
pub use recipe::RecipeService;
