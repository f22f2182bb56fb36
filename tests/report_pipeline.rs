use fellowship_reports::loader::{load_row_keys, load_rows};
use fellowship_reports::output::{export_file_name, write_csv, write_xlsx};
use fellowship_reports::{generate_report, ReportContext, ReportKind};
use pretty_assertions::assert_eq;
use std::fs;

const CLUSTER_ROWS: &str = "\
cluster,membership_status,gender,total,full_name
Ikeja,Member,Male,3,ignored
Ikeja,member,Female,2,ignored
Epe,Associate Coordinator,female,1,ignored
Epe,Visitor,MALE,4,ignored
Badagry,Worker,unknown,6,ignored
";

#[test]
fn csv_in_csv_out() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("clusters.csv");
    let keys = dir.path().join("clusters.txt");
    fs::write(&input, CLUSTER_ROWS).unwrap();
    fs::write(&keys, "Lekki\nIkeja\nEpe\n").unwrap();

    let (rows, report) = load_rows(&input).unwrap();
    assert_eq!(report.loaded_rows, 5);

    let ctx = ReportContext {
        expected_rows: load_row_keys(&keys).unwrap(),
        ..Default::default()
    };
    let generated = generate_report(ReportKind::StateCongressCluster, &ctx, &rows);
    let export = generated.rendered.export_rows();

    // Seeded clusters first, then Badagry from the data.
    let keys_in_order: Vec<&str> = export[2..6].iter().map(|r| r[0].as_str()).collect();
    assert_eq!(keys_in_order, ["Lekki", "Ikeja", "Epe", "Badagry"]);
    // Badagry's only row has an unrecognized gender and contributes nothing.
    assert_eq!(export[5].last().unwrap(), "0");
    assert_eq!(generated.totals.grand_total(), 10);
    assert_eq!(export.last().unwrap().last().unwrap(), "10");

    let out = dir.path().join(export_file_name(
        ReportKind::StateCongressCluster.slug(),
        None,
        None,
        "csv",
    ));
    write_csv(&out, &export).unwrap();

    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(&out)
        .unwrap();
    let read_back: Vec<Vec<String>> = rdr
        .records()
        .map(|r| r.unwrap().iter().map(str::to_string).collect())
        .collect();
    assert_eq!(read_back, export);
}

#[test]
fn json_rows_to_workbook() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("daily.json");
    fs::write(
        &input,
        r#"{"items":[
            {"state":"Lagos","registration_date":"2024-08-07","gender":"Female","total":5},
            {"state":"Lagos","registration_date":"2024-08-08","gender":"Male","total":"2"},
            {"state":"Ogun","day_key":"day2","gender":"male","total":1}
        ]}"#,
    )
    .unwrap();
    let (rows, _) = load_rows(&input).unwrap();

    let ctx = ReportContext {
        expected_rows: vec!["Lagos".into(), "Ogun".into(), "Oyo".into()],
        start: chrono::NaiveDate::from_ymd_opt(2024, 8, 7),
        end: chrono::NaiveDate::from_ymd_opt(2024, 8, 8),
        ..Default::default()
    };
    let generated = generate_report(ReportKind::ZonalDaily, &ctx, &rows);
    let export = generated.rendered.export_rows();
    assert_eq!(export.len(), generated.rendered.display_rows().len());
    assert_eq!(
        export.last().unwrap(),
        &["Grand Total", "5", "0", "5", "0", "3", "3", "5", "3", "8"]
    );

    let name = export_file_name(
        ReportKind::ZonalDaily.slug(),
        ctx.start_label().as_deref(),
        ctx.end_label().as_deref(),
        "xlsx",
    );
    assert_eq!(name, "zonal-daily-report-2024-08-07-to-2024-08-08.xlsx");
    let path = dir.path().join(name);
    write_xlsx(&path, ReportKind::ZonalDaily.sheet_name(), &export).unwrap();
    assert!(fs::metadata(&path).unwrap().len() > 0);
}
