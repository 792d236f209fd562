use std::cell::Cell;

use crate::types::{ConnectionRequest, Fingerprint, RequestKind};

/// Dimension segment used by observation requests with no dimension.
pub const NO_DIMENSION: &str = "NODIM";

/// Rendered in place of a missing measure or aggregation.
pub const UNDEFINED: &str = "undefined";

pub const DEFAULT_UNIQUE_PREFIX: &str = "conn_";

/// Hands out tokens for requests that cannot be fingerprinted.
///
/// Tokens are `prefix + n` with `n` strictly increasing, so a token is never
/// handed out twice by the same generator.
#[derive(Debug)]
pub struct UniqueIdGenerator {
    prefix: String,
    next: Cell<u64>,
}

impl UniqueIdGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: Cell::new(1),
        }
    }

    pub fn next_id(&self) -> String {
        let n = self.next.get();
        self.next.set(n + 1);
        format!("{}{}", self.prefix, n)
    }
}

impl Default for UniqueIdGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_UNIQUE_PREFIX)
    }
}

/// Map a request to its cache key.
///
/// - `dimensions:<dimension>`; measure, aggregation and buckets do not
///   change the value set of a dimension and are ignored.
/// - `observations:<dimension|NODIM>:<measure>:<aggregation>[:<interval>][:<bucket>]`
/// - anything else gets a fresh unique token and is never shared.
pub fn build_fingerprint(request: &ConnectionRequest, ids: &UniqueIdGenerator) -> Fingerprint {
    match &request.kind {
        RequestKind::Dimensions => Fingerprint::new(format!(
            "dimensions:{}",
            request.dimension.as_deref().unwrap_or(UNDEFINED)
        )),
        RequestKind::Observations => {
            let mut key = format!(
                "observations:{}:{}:{}",
                request.dimension.as_deref().unwrap_or(NO_DIMENSION),
                request.measure.as_deref().unwrap_or(UNDEFINED),
                request.aggregation.as_deref().unwrap_or(UNDEFINED),
            );

            // Interval before bucket, each only when provided.
            if let Some(interval) = &request.bucket_interval {
                key.push(':');
                key.push_str(&interval.to_string());
            }
            if let Some(bucket) = &request.bucket {
                key.push(':');
                key.push_str(&bucket.to_string());
            }

            Fingerprint::new(key)
        }
        RequestKind::Other(_) => Fingerprint::new(ids.next_id()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unique_ids_increase() {
        let ids = UniqueIdGenerator::new("x_");
        assert_eq!(ids.next_id(), "x_1");
        assert_eq!(ids.next_id(), "x_2");
    }

    #[test]
    fn empty_bucket_is_still_appended() {
        let ids = UniqueIdGenerator::default();
        let request = ConnectionRequest::observations()
            .with_dimension("age")
            .with_measure("count")
            .with_aggregation("sum")
            .with_bucket("");
        assert_eq!(
            build_fingerprint(&request, &ids).as_str(),
            "observations:age:count:sum:"
        );
    }
}
