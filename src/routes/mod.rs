pub mod classes;

pub mod dashboard;

pub mod enrollments;

pub mod subjects;

pub mod users;

pub use classes::configure_classes_routes;
pub use dashboard::configure_dashboard_routes;
pub use enrollments::configure_enrollments_routes;
pub use subjects::configure_subjects_routes;
pub use users::configure_user_routes;
