//! Derived views.
//!
//! Pure functions that turn store state into what the screens show:
//! substring search, province grouping, pagination arithmetic, statistics,
//! and Indonesian-locale date formatting.  Nothing here is cached; every
//! call recomputes from its inputs and is deterministic for identical
//! inputs.

use std::collections::BTreeMap;

use std::fmt::Display;

use chrono::{DateTime, FixedOffset, Local, Locale, TimeZone};

use crate::api::{NewsPost, School};

/// Prefix the directory puts in front of most province names.
pub const PROVINCE_PREFIX: &str = "Prov. ";

/// Status buckets that are always reported, even when empty.
pub const KNOWN_STATUSES: [&str; 2] = ["NEGERI", "SWASTA"];

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// `true` when `query` is blank, i.e. no filtering should happen.
pub fn is_blank(query: &str) -> bool {
    query.trim().is_empty()
}

fn contains_ci(haystack: &str, needle_lower: &str) -> bool {
    haystack.to_lowercase().contains(needle_lower)
}

/// Case-insensitive substring match over name, NPSN, street address and the
/// three administrative location names.  A blank query matches everything.
pub fn school_matches(school: &School, query: &str) -> bool {
    if is_blank(query) {
        return true;
    }
    let q = query.to_lowercase();
    [
        &school.name,
        &school.npsn,
        &school.street_address,
        &school.province,
        &school.regency,
        &school.district,
    ]
    .into_iter()
    .any(|field| contains_ci(field, &q))
}

/// Schools on the current page that match `query`.
///
/// With a blank query every school is returned, in order, by reference.
pub fn filter_schools<'a>(schools: &'a [School], query: &str) -> Vec<&'a School> {
    if is_blank(query) {
        return schools.iter().collect();
    }
    schools
        .iter()
        .filter(|school| school_matches(school, query))
        .collect()
}

/// Case-insensitive substring match on a post's title or description.
pub fn post_matches(post: &NewsPost, query: &str) -> bool {
    if is_blank(query) {
        return true;
    }
    let q = query.to_lowercase();
    contains_ci(&post.title, &q) || contains_ci(&post.description, &q)
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

/// Grouping key for a province name: the literal `"Prov. "` prefix is
/// stripped, anything else is used as-is.
pub fn province_key(province: &str) -> &str {
    province.strip_prefix(PROVINCE_PREFIX).unwrap_or(province)
}

/// Bucket schools by [`province_key`], keys in sorted order.
///
/// Every input school lands in exactly one bucket, and within a bucket the
/// input order is preserved.
pub fn group_by_province<'a>(schools: &[&'a School]) -> BTreeMap<&'a str, Vec<&'a School>> {
    let mut groups: BTreeMap<&'a str, Vec<&'a School>> = BTreeMap::new();
    for &school in schools {
        groups
            .entry(province_key(&school.province))
            .or_default()
            .push(school);
    }
    groups
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// `ceil(total / per_page)`; zero when there is nothing or `per_page` is 0.
pub fn total_pages(total: u64, per_page: u32) -> u32 {
    if per_page == 0 {
        return 0;
    }
    let pages = total.div_ceil(u64::from(per_page));
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// 1-based inclusive range of records shown on `page`, or `None` when the
/// page is empty.
pub fn showing_range(page: u32, per_page: u32, total: u64) -> Option<(u64, u64)> {
    if page == 0 || per_page == 0 {
        return None;
    }
    let first = u64::from(page - 1) * u64::from(per_page) + 1;
    let last = (u64::from(page) * u64::from(per_page)).min(total);
    (first <= last).then_some((first, last))
}

/// Page numbers for the pagination bar: the first page, the neighbours of
/// `current`, and the last page; sorted and de-duplicated.
///
/// Empty when there is at most one page.
pub fn page_window(current: u32, total: u32) -> Vec<u32> {
    if total <= 1 {
        return Vec::new();
    }
    let mut pages = vec![1];
    let lo = current.saturating_sub(1).max(2);
    let hi = current.saturating_add(1).min(total - 1);
    pages.extend(lo..=hi);
    pages.push(total);
    pages.sort_unstable();
    pages.dedup();
    pages
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Per-page counts by institutional form and by status.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchoolStats {
    pub by_form: BTreeMap<String, usize>,
    pub by_status: BTreeMap<String, usize>,
}

pub fn school_stats<'a>(schools: impl IntoIterator<Item = &'a School>) -> SchoolStats {
    let mut stats = SchoolStats::default();
    for status in KNOWN_STATUSES {
        stats.by_status.insert(status.to_string(), 0);
    }
    for school in schools {
        if !school.form.is_empty() {
            *stats.by_form.entry(school.form.clone()).or_default() += 1;
        }
        if !school.status.is_empty() {
            *stats.by_status.entry(school.status.clone()).or_default() += 1;
        }
    }
    stats
}

/// Google Maps link for a school's coordinates, when it has both.
pub fn map_link(school: &School) -> Option<String> {
    let (lat, lon) = (school.latitude.trim(), school.longitude.trim());
    if lat.is_empty() || lon.is_empty() {
        return None;
    }
    Some(format!("https://www.google.com/maps?q={lat},{lon}"))
}

// ---------------------------------------------------------------------------
// Dates
// ---------------------------------------------------------------------------

/// Parse an upstream timestamp (RFC 3339, falling back to RFC 2822).
///
/// The offset is kept; [`format_news`] converts to the viewer's zone.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    DateTime::parse_from_rfc3339(raw)
        .or_else(|_| DateTime::parse_from_rfc2822(raw))
        .ok()
}

/// Long-form Indonesian date, e.g. `Senin, 1 Januari 2024`.
pub fn format_long_date<Tz>(ts: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ts.format_localized("%A, %-d %B %Y", Locale::id_ID).to_string()
}

/// Long-form Indonesian date with time of day, e.g.
/// `Senin, 1 Januari 2024 10.30`.
pub fn format_long_datetime<Tz>(ts: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("{} {}", format_long_date(ts), ts.format("%H.%M"))
}

// ---------------------------------------------------------------------------
// News projection
// ---------------------------------------------------------------------------

/// A post ready for display: the post plus its formatted date and the
/// category it was fetched under.  Read-only; never written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormattedNewsItem {
    pub title: String,
    pub link: String,
    pub description: String,
    pub thumbnail: Option<String>,
    /// Raw upstream timestamp.
    pub pub_date: String,
    /// Localized date and time, or the raw timestamp when unparseable.
    pub formatted_date: String,
    pub category: String,
}

/// Filter `(category, post)` pairs by `query` and annotate each survivor.
/// Dates are shown in the local time zone.
pub fn format_news<'a>(
    posts: impl IntoIterator<Item = (&'a str, &'a NewsPost)>,
    query: &str,
) -> Vec<FormattedNewsItem> {
    format_news_in(posts, query, &Local)
}

/// [`format_news`] with dates shown in `tz`.
pub fn format_news_in<'a, Tz>(
    posts: impl IntoIterator<Item = (&'a str, &'a NewsPost)>,
    query: &str,
    tz: &Tz,
) -> Vec<FormattedNewsItem>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    posts
        .into_iter()
        .filter(|(_, post)| post_matches(post, query))
        .map(|(category, post)| FormattedNewsItem {
            title: post.title.clone(),
            link: post.link.clone(),
            description: post.description.clone(),
            thumbnail: post.thumbnail.clone(),
            pub_date: post.pub_date.clone(),
            formatted_date: parse_timestamp(&post.pub_date)
                .map(|ts| format_long_datetime(&ts.with_timezone(tz)))
                .unwrap_or_else(|| post.pub_date.clone()),
            category: category.to_string(),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
