//! The report catalogue: each report is a pivot config plus a layout.

use crate::dimension::{
    congress_days, retreat_days, service_groups, session_key, sessions_from_rows, DayResolver,
};
use crate::error::{ReportError, Result};
use crate::normalize::KeyNormalizer;
use crate::pivot::{Measure, PivotConfig, PivotMatrix, SubDimension, UnrecognizedPolicy};
use crate::render::{render, GrandTotal, GroupedLayout, Layout, RenderedReport, SerialLayout};
use crate::totals::{totals, Totals};
use crate::types::{ColumnSummary, Field, RawRow, SummaryStats};
use chrono::NaiveDate;
use std::fmt;
use std::str::FromStr;
use tracing::debug;

const UNKNOWN_CENTRE: &str = "Unknown Centre";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportKind {
    ZonalMembership,
    ZonalDaily,
    StateCongressRegion,
    StateCongressCategory,
    StateCongressMembership,
    StateCongressCluster,
    StateCongressInstitution,
    RetreatCluster,
    RetreatCentre,
    WeeklyAttendance,
    Gck,
}

impl ReportKind {
    pub const ALL: [ReportKind; 11] = [
        ReportKind::ZonalMembership,
        ReportKind::ZonalDaily,
        ReportKind::StateCongressRegion,
        ReportKind::StateCongressCategory,
        ReportKind::StateCongressMembership,
        ReportKind::StateCongressCluster,
        ReportKind::StateCongressInstitution,
        ReportKind::RetreatCluster,
        ReportKind::RetreatCentre,
        ReportKind::WeeklyAttendance,
        ReportKind::Gck,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            ReportKind::ZonalMembership => "zonal-membership-report",
            ReportKind::ZonalDaily => "zonal-daily-report",
            ReportKind::StateCongressRegion => "state-congress-region-report",
            ReportKind::StateCongressCategory => "state-congress-category-report",
            ReportKind::StateCongressMembership => "state-congress-membership-report",
            ReportKind::StateCongressCluster => "state-congress-cluster-report",
            ReportKind::StateCongressInstitution => "state-congress-membership-institution",
            ReportKind::RetreatCluster => "retreat-cluster-report",
            ReportKind::RetreatCentre => "retreat-centre-report",
            ReportKind::WeeklyAttendance => "weekly-attendance-report",
            ReportKind::Gck => "gck-attendance-report",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            ReportKind::ZonalMembership => "Membership Status by State",
            ReportKind::ZonalDaily => "Daily Registration by State",
            ReportKind::StateCongressRegion => "Daily Registration by Region",
            ReportKind::StateCongressCategory => "Registration Category by Region",
            ReportKind::StateCongressMembership => "Membership Status by Region",
            ReportKind::StateCongressCluster => "Membership Status by Cluster",
            ReportKind::StateCongressInstitution => "Membership Status by Institution",
            ReportKind::RetreatCluster => "Cluster Attendance by Day",
            ReportKind::RetreatCentre => "Attendance by Fellowship Centre",
            ReportKind::WeeklyAttendance => "Weekly Attendance Report",
            ReportKind::Gck => "Global Crusade Attendance Report",
        }
    }

    pub fn sheet_name(self) -> &'static str {
        match self {
            ReportKind::WeeklyAttendance => "Weekly Report",
            ReportKind::Gck => "GCK Report",
            _ => "Report",
        }
    }

    /// Pivot configuration for this report. GCK columns depend on the
    /// sessions present, so the rows are needed up front.
    pub fn pivot(self, ctx: &ReportContext, rows: &[RawRow]) -> PivotConfig {
        let gender = self.gender_split();
        let builder = PivotConfig::builder()
            .expected_rows(ctx.expected_rows.iter().cloned())
            .measure(if ctx.count_rows {
                Measure::Count
            } else {
                Measure::Field
            });

        let builder = match self {
            ReportKind::ZonalMembership => builder
                .rows_by_field(Field::State)
                .columns_normalized(Field::MembershipStatus, KeyNormalizer::membership_status())
                .sub_dimension(gender),
            ReportKind::StateCongressMembership => builder
                .rows_by_field(Field::Region)
                .columns_normalized(Field::MembershipStatus, KeyNormalizer::membership_status())
                .sub_dimension(gender),
            ReportKind::StateCongressCluster => builder
                .rows_by_field(Field::Cluster)
                .columns_normalized(Field::MembershipStatus, KeyNormalizer::membership_status())
                .sub_dimension(gender),
            ReportKind::StateCongressInstitution => builder
                .rows_by_field(Field::Institution)
                .columns_normalized(Field::MembershipStatus, KeyNormalizer::membership_status())
                .sub_dimension(gender),
            ReportKind::StateCongressCategory => builder
                .rows_by_field(Field::Region)
                .columns_normalized(Field::Category, KeyNormalizer::congress_category())
                .sub_dimension(gender),
            ReportKind::RetreatCentre => builder
                .rows_by_field(Field::DlcfCenter)
                .row_fallback(UNKNOWN_CENTRE)
                .columns_normalized(Field::Category, KeyNormalizer::retreat_category())
                .sub_dimension(gender),
            ReportKind::ZonalDaily | ReportKind::StateCongressRegion => {
                let days = congress_days(ctx.start, ctx.end);
                let resolver = DayResolver::new(&days);
                let row_field = if self == ReportKind::ZonalDaily {
                    Field::State
                } else {
                    Field::Region
                };
                builder
                    .rows_by_field(row_field)
                    .columns(days)
                    .columns_by(move |r| resolver.resolve(r))
                    .sub_dimension(gender)
            }
            ReportKind::RetreatCluster => {
                let days = retreat_days(ctx.retreat_days);
                let resolver = DayResolver::new(&days);
                builder
                    .rows_by_field(Field::Cluster)
                    .columns(days)
                    .columns_by(move |r| resolver.resolve(r))
                    .sub_dimension(gender)
            }
            ReportKind::WeeklyAttendance => builder
                .rows_by_field(Field::FellowshipCentre)
                .row_fallback(UNKNOWN_CENTRE)
                .columns(service_groups())
                .columns_by_field(Field::ServiceDay)
                .column_fallback("unknown")
                .sub_dimension(SubDimension::category_gender(
                    &[("adult", "ADULT"), ("youth", "YOUTH"), ("children", "CHILDREN")],
                    &[("male", "MALE"), ("female", "FEMALE")],
                ))
                .sub_key_by(category_gender_key),
            ReportKind::Gck => builder
                .rows_by_field(Field::FellowshipCentre)
                .row_fallback(UNKNOWN_CENTRE)
                .columns(sessions_from_rows(rows))
                .columns_by(|r| Some(session_key(r)))
                .sub_dimension(SubDimension::category_gender(
                    &[("adult", "Adult"), ("youth", "Youth"), ("children", "Children")],
                    &[("male", "M"), ("female", "F")],
                ))
                .sub_key_by(category_gender_key),
        };

        let builder = match &ctx.other_gender {
            Some(label) if !matches!(self, ReportKind::WeeklyAttendance | ReportKind::Gck) => {
                builder.sub_dimension(
                    self.gender_split()
                        .with_policy(UnrecognizedPolicy::Bucket(label.clone())),
                )
            }
            _ => builder,
        };
        builder.build()
    }

    /// Retreat sheets list men first; every congress sheet lists women first.
    fn gender_split(self) -> SubDimension {
        match self {
            ReportKind::RetreatCluster | ReportKind::RetreatCentre => {
                SubDimension::gender_male_first()
            }
            _ => SubDimension::gender(),
        }
    }

    pub fn layout(self, ctx: &ReportContext) -> Layout {
        match self {
            ReportKind::ZonalMembership => Layout::grouped(GroupedLayout::new("State")),
            ReportKind::ZonalDaily => Layout::grouped(
                GroupedLayout::new("State")
                    .grand(GrandTotal::Split("Grand Total".into()))
                    .totals_label("Grand Total"),
            ),
            ReportKind::StateCongressRegion
            | ReportKind::StateCongressCategory
            | ReportKind::StateCongressMembership => {
                Layout::grouped(GroupedLayout::new("Region"))
            }
            ReportKind::StateCongressCluster => Layout::grouped(GroupedLayout::new("Cluster")),
            ReportKind::RetreatCluster => {
                Layout::grouped(GroupedLayout::new("Cluster").grand(GrandTotal::None))
            }
            ReportKind::StateCongressInstitution => {
                Layout::grouped(GroupedLayout::new("Institution"))
            }
            ReportKind::RetreatCentre => Layout::grouped(
                GroupedLayout::new("DLCF Center").grand(GrandTotal::Single("Total".into())),
            ),
            ReportKind::WeeklyAttendance => Layout::serial(SerialLayout::new("DISTRICT")),
            ReportKind::Gck => Layout::serial(
                SerialLayout::new("DISTRICT")
                    .group_total("Total")
                    .totals_prefix("TOTAL", ""),
            )
            .with_preamble(vec![
                vec![
                    "GROUP NAME".to_string(),
                    ctx.group_name.clone().unwrap_or_else(|| "DLCF".to_string()),
                ],
                vec![
                    "GROUP COORDINATOR".to_string(),
                    ctx.coordinator
                        .clone()
                        .unwrap_or_else(|| "State Coordinator".to_string()),
                ],
                vec!["MONTH".to_string(), ctx.month.clone().unwrap_or_default()],
            ]),
        }
    }
}

fn category_gender_key(row: &RawRow) -> Option<String> {
    Some(format!(
        "{}:{}",
        row.get(Field::Category).unwrap_or(""),
        row.get(Field::Gender).unwrap_or("")
    ))
}

impl fmt::Display for ReportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_lowercase();
        ReportKind::ALL
            .into_iter()
            .find(|k| k.slug() == wanted || k.slug().trim_end_matches("-report") == wanted)
            .ok_or_else(|| ReportError::UnknownReport(s.to_string()))
    }
}

/// Settings one report run depends on. Each run owns its own context.
#[derive(Debug, Clone, Default)]
pub struct ReportContext {
    /// Organisational units to show even without submissions.
    pub expected_rows: Vec<String>,
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
    pub retreat_days: [Option<NaiveDate>; 4],
    /// Count each input row once instead of reading `total`.
    pub count_rows: bool,
    /// Count unrecognized genders in an extra bucket with this label.
    pub other_gender: Option<String>,
    pub group_name: Option<String>,
    pub coordinator: Option<String>,
    pub month: Option<String>,
}

impl ReportContext {
    pub fn start_label(&self) -> Option<String> {
        self.start.map(|d| d.format("%Y-%m-%d").to_string())
    }

    pub fn end_label(&self) -> Option<String> {
        self.end.map(|d| d.format("%Y-%m-%d").to_string())
    }
}

/// One aggregation pass and everything derived from it.
#[derive(Debug, Clone)]
pub struct Report {
    pub kind: ReportKind,
    pub matrix: PivotMatrix,
    pub totals: Totals,
    pub rendered: RenderedReport,
}

pub fn generate_report(kind: ReportKind, ctx: &ReportContext, rows: &[RawRow]) -> Report {
    let config = kind.pivot(ctx, rows);
    let matrix = config.aggregate(rows);
    let totals = totals(&matrix, matrix.columns());
    let rendered = render(&matrix, matrix.columns(), &totals, &kind.layout(ctx));
    debug!(
        report = kind.slug(),
        rows = matrix.rows().len(),
        grand_total = totals.grand_total(),
        "generated report"
    );
    Report {
        kind,
        matrix,
        totals,
        rendered,
    }
}

impl Report {
    pub fn summary(&self) -> SummaryStats {
        let by_column = self
            .matrix
            .columns()
            .iter()
            .zip(&self.totals.by_column)
            .map(|(column, tally)| ColumnSummary {
                key: column.key.clone(),
                label: column.label.clone(),
                buckets: self
                    .matrix
                    .buckets()
                    .iter()
                    .enumerate()
                    .map(|(i, b)| (b.key.clone(), tally.get(i)))
                    .collect(),
                total: tally.total(),
            })
            .collect();
        SummaryStats {
            report: self.kind.slug().to_string(),
            rows: self.matrix.rows().len(),
            columns: self.matrix.columns().len(),
            grand_total: self.totals.grand_total(),
            by_column,
        }
    }
}
