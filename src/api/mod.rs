pub mod admin;
pub mod redirect;

pub use admin::admin_routes;
pub use redirect::redirect_routes;
