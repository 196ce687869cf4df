pub mod attempt_limiter;
pub mod mapbox;
pub mod metrics;
pub mod oracle;
pub mod route_matcher;
pub mod session;
