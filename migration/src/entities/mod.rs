pub mod link;
pub mod link_preview;
pub mod splash_page;
pub mod visit;

pub use link::Entity as LinkEntity;
pub use link_preview::Entity as LinkPreviewEntity;
pub use splash_page::Entity as SplashPageEntity;
pub use visit::Entity as VisitEntity;
