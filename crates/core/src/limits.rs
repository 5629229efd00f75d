//! Default page sizes and chart bounds.

/// Rows per `list_path_stats` page when the site sets no limit.
pub const DEFAULT_PAGE_LIMIT: u32 = 20;

/// Rows per `list_referrers` page when the site sets no limit.
pub const DEFAULT_REF_LIMIT: u32 = 10;

/// Lowest chart maximum for a path, so that low-traffic paths don't render
/// as full-height bars.
pub const MIN_CHART_MAX: u64 = 10;
