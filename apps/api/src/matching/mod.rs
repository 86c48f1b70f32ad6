// Team/candidate matching: aggregates the current members into a team profile
// and rates invite candidates against it. Pure computation over fetched rows.

pub mod profile;
pub mod scorer;
