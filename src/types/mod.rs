pub mod cut;
pub mod identifiers;
pub mod request;

pub use cut::{Cut, CutValue};
pub use identifiers::{DatasetId, Fingerprint};
pub use request::{BucketValue, ConnectionRequest, RequestKind};
