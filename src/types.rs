use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One record as returned by the reporting API.
///
/// Every report page reads a different subset of these fields, so the row is
/// the union of all of them. Values are kept as text and only interpreted by
/// the pivot configuration that consumes them.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct RawRow {
    #[serde(default, deserialize_with = "lenient_text")]
    pub state: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub region: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub cluster: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub dlcf_center: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub fellowship_centre: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub institution: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub membership_status: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub day_key: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub service_day: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub session_label: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub session_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub registration_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub gender: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub total: Option<String>,
}

/// Named access to the text fields of a [`RawRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    State,
    Region,
    Cluster,
    DlcfCenter,
    FellowshipCentre,
    Institution,
    Category,
    MembershipStatus,
    DayKey,
    ServiceDay,
    SessionLabel,
    SessionDate,
    RegistrationDate,
    Gender,
    Total,
}

impl Field {
    pub const ALL: [Field; 15] = [
        Field::State,
        Field::Region,
        Field::Cluster,
        Field::DlcfCenter,
        Field::FellowshipCentre,
        Field::Institution,
        Field::Category,
        Field::MembershipStatus,
        Field::DayKey,
        Field::ServiceDay,
        Field::SessionLabel,
        Field::SessionDate,
        Field::RegistrationDate,
        Field::Gender,
        Field::Total,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Field::State => "state",
            Field::Region => "region",
            Field::Cluster => "cluster",
            Field::DlcfCenter => "dlcf_center",
            Field::FellowshipCentre => "fellowship_centre",
            Field::Institution => "institution",
            Field::Category => "category",
            Field::MembershipStatus => "membership_status",
            Field::DayKey => "day_key",
            Field::ServiceDay => "service_day",
            Field::SessionLabel => "session_label",
            Field::SessionDate => "session_date",
            Field::RegistrationDate => "registration_date",
            Field::Gender => "gender",
            Field::Total => "total",
        }
    }
}

impl RawRow {
    /// Trimmed, non-empty value of `field`.
    pub fn get(&self, field: Field) -> Option<&str> {
        let value = match field {
            Field::State => &self.state,
            Field::Region => &self.region,
            Field::Cluster => &self.cluster,
            Field::DlcfCenter => &self.dlcf_center,
            Field::FellowshipCentre => &self.fellowship_centre,
            Field::Institution => &self.institution,
            Field::Category => &self.category,
            Field::MembershipStatus => &self.membership_status,
            Field::DayKey => &self.day_key,
            Field::ServiceDay => &self.service_day,
            Field::SessionLabel => &self.session_label,
            Field::SessionDate => &self.session_date,
            Field::RegistrationDate => &self.registration_date,
            Field::Gender => &self.gender,
            Field::Total => &self.total,
        };
        value.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    /// Store `value` verbatim (trimmed), treating blank text as absent.
    pub fn set(&mut self, field: Field, value: &str) {
        let slot = match field {
            Field::State => &mut self.state,
            Field::Region => &mut self.region,
            Field::Cluster => &mut self.cluster,
            Field::DlcfCenter => &mut self.dlcf_center,
            Field::FellowshipCentre => &mut self.fellowship_centre,
            Field::Institution => &mut self.institution,
            Field::Category => &mut self.category,
            Field::MembershipStatus => &mut self.membership_status,
            Field::DayKey => &mut self.day_key,
            Field::ServiceDay => &mut self.service_day,
            Field::SessionLabel => &mut self.session_label,
            Field::SessionDate => &mut self.session_date,
            Field::RegistrationDate => &mut self.registration_date,
            Field::Gender => &mut self.gender,
            Field::Total => &mut self.total,
        };
        let value = value.trim();
        *slot = (!value.is_empty()).then(|| value.to_string());
    }
}

impl std::str::FromStr for Field {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.name() == s.trim())
            .ok_or(())
    }
}

/// The API is not consistent about numbers vs strings (`"total": 3` and
/// `"total": "3"` both occur), so accept any scalar and keep its text form.
///
/// Only JSON goes through this path. CSV cells are already text and are
/// copied field by field in the loader, since a self-describing read of a
/// CSV cell would turn `"007"` into `7`.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    struct TextVisitor;

    impl<'de> Visitor<'de> for TextVisitor {
        type Value = Option<String>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a string, number, boolean or null")
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
            let v = v.trim();
            Ok(if v.is_empty() { None } else { Some(v.to_string()) })
        }

        fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
            self.visit_str(&v)
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
            Ok(Some(v.to_string()))
        }

        fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
            Ok(None)
        }

        fn visit_some<D2>(self, deserializer: D2) -> Result<Self::Value, D2::Error>
        where
            D2: Deserializer<'de>,
        {
            deserializer.deserialize_any(TextVisitor)
        }
    }

    deserializer.deserialize_any(TextVisitor)
}

/// One entry of an ordered dimension: a stable key plus the header label.
///
/// `date` is only set for day columns, where rows may be matched by their
/// registration date instead of an explicit key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DimensionKey {
    pub key: String,
    pub label: String,
    pub date: Option<String>,
}

impl DimensionKey {
    pub fn new(key: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            date: None,
        }
    }

    /// A key whose label is the key itself.
    pub fn plain(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            label: key.clone(),
            key,
            date: None,
        }
    }
}

/// Per-cell counts, one slot per sub-dimension bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Tally(pub Vec<u64>);

impl Tally {
    pub fn zeroed(width: usize) -> Self {
        Tally(vec![0; width])
    }

    /// Sum of all slots, pinned at `u64::MAX` rather than wrapping.
    pub fn total(&self) -> u64 {
        self.0.iter().fold(0u64, |acc, v| acc.saturating_add(*v))
    }

    pub fn get(&self, index: usize) -> u64 {
        self.0.get(index).copied().unwrap_or(0)
    }

    pub fn add(&mut self, index: usize, amount: u64) {
        if let Some(slot) = self.0.get_mut(index) {
            *slot = slot.saturating_add(amount);
        }
    }

    pub fn merge(&mut self, other: &Tally) {
        for (i, v) in other.0.iter().enumerate() {
            self.add(i, *v);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ColumnSummary {
    pub key: String,
    pub label: String,
    pub buckets: Vec<(String, u64)>,
    pub total: u64,
}

/// Written next to each export as a machine-readable digest.
#[derive(Debug, Serialize)]
pub struct SummaryStats {
    pub report: String,
    pub rows: usize,
    pub columns: usize,
    pub grand_total: u64,
    pub by_column: Vec<ColumnSummary>,
}
