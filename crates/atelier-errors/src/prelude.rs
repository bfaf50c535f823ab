pub use crate::codes;
pub use crate::codes::Code;
pub use crate::model::{to_http_response, ErrorBuilder, ErrorObj, PublicErrorView};
pub use crate::retry::RetryClass;
