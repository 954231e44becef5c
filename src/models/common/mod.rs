pub mod pagination;
pub mod response;

pub use pagination::{PaginationInfo, PaginationQuery, deserialize_optional_i64};
pub use response::ApiResponse;
