pub mod collection;
pub mod record;

pub use collection::get as list;
pub use collection::post as create;
pub use record::get as retrieve;
pub use record::put as update;
