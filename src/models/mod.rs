pub mod content;
pub mod conversation;
pub mod tour;

pub use content::*;
pub use conversation::*;
pub use tour::*;
