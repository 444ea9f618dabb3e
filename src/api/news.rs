//! News aggregator wire types.
//!
//! The aggregator exposes a root listing of publishers ("sources"), each
//! with a list of sections ("categories"), and one endpoint per
//! source/category pair returning the latest posts.

use serde::Deserialize;

use super::null_as_default;

/// A category path under a news source, e.g. `terbaru` or `politik`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CategoryPath {
    pub name: String,

    /// Absolute URL of the category endpoint as advertised by the catalog.
    #[serde(default, alias = "link", deserialize_with = "null_as_default")]
    pub path: String,
}

/// A news publisher from the catalog.
///
/// `name` is the key used in request paths and is unique within a catalog.
/// The branding fields are only present when the entry doubles as a
/// category-level descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsSource {
    pub name: String,

    #[serde(default)]
    pub paths: Vec<CategoryPath>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub link: Option<String>,
}

impl NewsSource {
    /// Category names in catalog order.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(|p| p.name.as_str())
    }
}

/// The aggregator's root listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SourceCatalog {
    #[serde(default)]
    pub endpoints: Vec<NewsSource>,
}

/// A single post under a category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsPost {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub link: String,

    /// Publication timestamp exactly as the upstream sent it.
    #[serde(rename = "pubDate", default, deserialize_with = "null_as_default")]
    pub pub_date: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default)]
    pub thumbnail: Option<String>,
}

/// Posts of one category together with the category's own descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsChannel {
    #[serde(default, deserialize_with = "null_as_default")]
    pub posts: Vec<NewsPost>,

    #[serde(default)]
    pub title: Option<String>,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default)]
    pub image: Option<String>,

    #[serde(default)]
    pub link: Option<String>,
}

/// Envelope of a source/category response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NewsPayload {
    #[serde(default, deserialize_with = "null_as_default")]
    pub data: NewsChannel,
}
