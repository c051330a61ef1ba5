pub mod login;
pub mod refresh;

pub use login::login_post;
pub use refresh::refresh_post;
