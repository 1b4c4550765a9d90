// Public handlers: no authentication required.

pub mod login;
pub mod status;

pub use login::post as login_post;
pub use status::{health, root};
