//! School directory wire types.
//!
//! The directory API speaks Indonesian field names (`sekolah`, `propinsi`,
//! `kabupaten_kota`, ...).  They are mapped onto English field names here so
//! the rest of the application never has to know the upstream spelling.

use serde::Deserialize;

use super::{lenient_u32, lenient_u64, null_as_default};
use crate::view;

/// A single school record as returned by the directory API.
///
/// Records are replaced wholesale by the next fetch; `id` is only unique
/// within one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct School {
    #[serde(default, deserialize_with = "null_as_default")]
    pub id: String,

    /// National school registration number (NPSN).
    #[serde(default, deserialize_with = "null_as_default")]
    pub npsn: String,

    #[serde(rename = "sekolah", default, deserialize_with = "null_as_default")]
    pub name: String,

    /// Institutional form, e.g. `SD`, `SMP`, `SMA`, `SMK`.
    #[serde(rename = "bentuk", default, deserialize_with = "null_as_default")]
    pub form: String,

    /// Operating status (`N` / `NEGERI` for public, `S` / `SWASTA` for private).
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: String,

    #[serde(rename = "alamat_jalan", default, deserialize_with = "null_as_default")]
    pub street_address: String,

    #[serde(rename = "lintang", default, deserialize_with = "null_as_default")]
    pub latitude: String,

    #[serde(rename = "bujur", default, deserialize_with = "null_as_default")]
    pub longitude: String,

    #[serde(rename = "kode_prop", default, deserialize_with = "null_as_default")]
    pub province_code: String,

    /// Province name, usually carrying a `"Prov. "` prefix.
    #[serde(rename = "propinsi", default, deserialize_with = "null_as_default")]
    pub province: String,

    #[serde(rename = "kode_kab_kota", default, deserialize_with = "null_as_default")]
    pub regency_code: String,

    #[serde(rename = "kabupaten_kota", default, deserialize_with = "null_as_default")]
    pub regency: String,

    #[serde(rename = "kode_kec", default, deserialize_with = "null_as_default")]
    pub district_code: String,

    #[serde(rename = "kecamatan", default, deserialize_with = "null_as_default")]
    pub district: String,
}

/// One page of the directory listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct SchoolPage {
    #[serde(rename = "dataSekolah", default, deserialize_with = "null_as_default")]
    pub schools: Vec<School>,

    /// Total number of records the upstream claims to have.
    #[serde(default, deserialize_with = "lenient_u64")]
    pub total_data: u64,

    #[serde(default, deserialize_with = "lenient_u32")]
    pub page: u32,

    #[serde(default, deserialize_with = "lenient_u32")]
    pub per_page: u32,
}

impl SchoolPage {
    /// Re-apply a search query to this page only.
    ///
    /// The upstream may ignore the search parameter, so the page is narrowed
    /// locally and `total_data` is rewritten to the number of survivors.
    /// Only the current page is searched, never the whole directory.
    pub fn retain_matching(&mut self, query: &str) {
        self.schools
            .retain(|school| view::school_matches(school, query));
        self.total_data = self.schools.len() as u64;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Shorthand constructor for tests.
    pub fn make_school(id: &str, name: &str, province: &str) -> School {
        School {
            id: id.to_string(),
            npsn: format!("2010{id:0>4}"),
            name: name.to_string(),
            form: "SMA".to_string(),
            status: "N".to_string(),
            street_address: "Jl. Merdeka No. 1".to_string(),
            province: province.to_string(),
            regency: "Kota Bandung".to_string(),
            district: "Kec. Sumur Bandung".to_string(),
            ..School::default()
        }
    }

    #[test]
    fn decodes_directory_page() {
        let json = r#"{
            "creator": "someone",
            "status": "success",
            "dataSekolah": [{
                "id": "A1",
                "npsn": "20100001",
                "sekolah": "SMA NEGERI 1 BANDUNG",
                "bentuk": "SMA",
                "status": "N",
                "alamat_jalan": "Jl. Ir. H. Juanda No. 93",
                "lintang": "-6.8845",
                "bujur": "107.6133",
                "kode_prop": "020000",
                "propinsi": "Prov. Jawa Barat",
                "kode_kab_kota": "026000",
                "kabupaten_kota": "Kota Bandung",
                "kode_kec": "026001",
                "kecamatan": "Kec. Coblong"
            }],
            "total_data": 25,
            "page": 1,
            "per_page": 10
        }"#;

        let page: SchoolPage = serde_json::from_str(json).unwrap();

        assert_eq!(page.total_data, 25);
        assert_eq!(page.page, 1);
        assert_eq!(page.per_page, 10);
        assert_eq!(page.schools.len(), 1);

        let school = &page.schools[0];
        assert_eq!(school.name, "SMA NEGERI 1 BANDUNG");
        assert_eq!(school.province, "Prov. Jawa Barat");
        assert_eq!(school.regency, "Kota Bandung");
        assert_eq!(school.district, "Kec. Coblong");
        assert_eq!(school.latitude, "-6.8845");
    }

    #[test]
    fn tolerates_stringly_numbers_and_nulls() {
        let json = r#"{
            "dataSekolah": [{ "id": "B", "sekolah": "SD 1", "lintang": null }],
            "total_data": "42",
            "page": "3",
            "per_page": null
        }"#;

        let page: SchoolPage = serde_json::from_str(json).unwrap();

        assert_eq!(page.total_data, 42);
        assert_eq!(page.page, 3);
        assert_eq!(page.per_page, 0);
        assert_eq!(page.schools[0].latitude, "");
        assert_eq!(page.schools[0].npsn, "");
    }

    #[test]
    fn missing_listing_decodes_as_empty_page() {
        let page: SchoolPage = serde_json::from_str("{}").unwrap();
        assert!(page.schools.is_empty());
        assert_eq!(page.total_data, 0);
    }

    #[test]
    fn retain_matching_rewrites_total_to_page_survivors() {
        let mut page = SchoolPage {
            schools: vec![
                make_school("1", "SMA Negeri 1 Bandung", "Prov. Jawa Barat"),
                make_school("2", "SMK Harapan", "Prov. Bali"),
                make_school("3", "SMA Negeri 3 Bandung", "Prov. Jawa Barat"),
            ],
            total_data: 1_000,
            page: 1,
            per_page: 10,
        };

        page.retain_matching("negeri");

        assert_eq!(page.schools.len(), 2);
        assert_eq!(page.total_data, 2, "total only reflects the current page");
    }
}
