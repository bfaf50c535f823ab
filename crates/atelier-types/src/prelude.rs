pub use crate::id::Id;
pub use crate::subject::Subject;
