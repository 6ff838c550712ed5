use std::collections::HashSet;

use crate::models::job::JobPosting;

/// Drop postings whose `url` was already seen, keeping the first.
///
/// The key is the raw URL string: trailing slashes, query strings and host
/// casing are not normalized, so links differing only in tracking
/// parameters stay distinct.
pub fn dedupe(jobs: Vec<JobPosting>) -> Vec<JobPosting> {
    let mut seen = HashSet::with_capacity(jobs.len());
    jobs.into_iter()
        .filter(|job| seen.insert(job.url.clone()))
        .collect()
}
