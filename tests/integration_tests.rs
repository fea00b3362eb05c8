use anyhow::Result;
use sectioned_report_parser::*;

const REFERENCE_CSV: &str = "\
Region;Country
EUROPE;GERMANY
EUROPE;FRANCE
EUROPE;NETHERLANDS
CIS;UKRAINE
CIS;KAZAKHSTAN
FAR EAST;JAPAN
FAR EAST;SOUTH KOREA
";

const NATIONALITY_CSV: &str = "\
NATIONALITY PERFORMANCE REPORT;;;
Period 01.01.2025 - 28.02.2025;;;
;;;
AgencyGroup;Arrival Room;Night Room;EUR Revenue
01-JANUARY;;;
EUROPE;;;
GERMANY;;;
ANEX-BERLIN;12;84;1.204,50
FIT HOL-MUNICH;3;21;310,00
TOTAL GERMANY;15;105;1.514,50
NETHERLAND;;;
CORENDON-AMS;7;49;2.001,75
USER DEFINED;1;1;1
CIS;;;
ANEX-ALMATY;4;28;-
02-FEBRUARY;;;
UKRAIN;;;
ANEX-KIEV;5;35;700
JAPAN;;;
HIS-TOKYO;2;10;n/a
GRAND TOTAL;40;280;6.000,00
";

const AGENCY_CSV: &str = "\
HOTEL AGENCY REPORT;;;;
Agency;Arrival Room;Night Room;EUR Revenue;EUR Avg PerPaidPax
01-JANUARY;;;;
CIS_COMMONWEALTH OF INDEPENDENT STATES;;;;
ANEX-KIEV;10;70;7000,5;50
PEGAS TOURISTIK;2;14;1400;50
TOTAL;12;84;8400,5;
EUROPE_EUROPE MARKET;;;;
FIT HOL-123;1;7;500;71,4
UK_UNITED KINGDOM;;;;
WEB-DIRECT;1;3;abc;
02-FEBRUARY;;;;
MIDDLEEAST_MIDDLE EAST MARKET;;;;
SETUR-ANKARA;3;9;900;33,3
";

fn grid_from_csv(data: &str) -> Result<Vec<Vec<CellValue>>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(data.as_bytes());

    let mut grid = Vec::new();
    for record in reader.records() {
        let record = record?;
        grid.push(
            record
                .iter()
                .map(|field| {
                    if field.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::from(field)
                    }
                })
                .collect(),
        );
    }
    Ok(grid)
}

fn reference() -> Result<ReferenceIndex> {
    Ok(load_reference_index(&grid_from_csv(REFERENCE_CSV)?)?)
}

#[test]
fn test_nationality_report() -> Result<()> {
    let reference = reference()?;
    let grid = grid_from_csv(NATIONALITY_CSV)?;
    let config = ParserConfig::region_country_report();

    let output = process_sectioned_report(&grid, &config, Some(&reference))?;
    let rows = &output.rows;

    let summary: Vec<(&str, &str, Option<&str>, &str)> = rows
        .iter()
        .map(|r| {
            (
                r.month.as_str(),
                r.market_or_region.as_str(),
                r.country.as_deref(),
                r.entity.as_str(),
            )
        })
        .collect();

    assert_eq!(
        summary,
        vec![
            ("January", "Europe", Some("Germany"), "ANEX-BERLIN"),
            ("January", "Europe", Some("Germany"), "FIT HOL-MUNICH"),
            ("January", "Europe", Some("Netherlands"), "CORENDON-AMS"),
            ("January", "Cis", None, "ANEX-ALMATY"),
            ("February", "Cis", Some("Ukraine"), "ANEX-KIEV"),
            ("February", "Far East", Some("Japan"), "HIS-TOKYO"),
        ]
    );

    assert_eq!(rows[0].measure("eur_revenue"), Numeric::Value(1204.5));
    assert_eq!(rows[0].measure("night_room"), Numeric::Value(84.0));
    assert_eq!(rows[3].measure("eur_revenue"), Numeric::Value(0.0));
    assert_eq!(rows[5].measure("eur_revenue"), Numeric::Value(0.0));
    assert!(rows.iter().all(|r| r.entity_group.is_none()));
    assert_eq!(rows[0].month_number(), Some(1));

    let stats = &output.stats;
    assert_eq!(stats.month_headers, 2);
    assert_eq!(stats.region_headers, 2);
    assert_eq!(stats.country_headers, 4);
    assert_eq!(stats.header_rows, 8);
    assert_eq!(stats.fuzzy_countries, 2);
    assert_eq!(stats.noise_rows, 3);
    assert_eq!(stats.orphaned_rows, 0);
    assert_eq!(stats.rows_emitted, 6);

    Ok(())
}

#[test]
fn test_agency_report() -> Result<()> {
    let grid = grid_from_csv(AGENCY_CSV)?;
    let config = ParserConfig::market_report();

    let output = process_sectioned_report(&grid, &config, None)?;
    let rows = &output.rows;
    assert_eq!(rows.len(), 5);

    let groups: Vec<(&str, &str, Option<&str>)> = rows
        .iter()
        .map(|r| {
            (
                r.month.as_str(),
                r.market_or_region.as_str(),
                r.entity_group.as_deref(),
            )
        })
        .collect();

    assert_eq!(
        groups,
        vec![
            ("JANUARY", "CIS", Some("Anex Tour")),
            ("JANUARY", "CIS", Some("SORSAT")),
            ("JANUARY", "EUROPE", Some("FIT TURIZM")),
            ("JANUARY", "EUROPE", Some("WEB")),
            ("FEBRUARY", "ORTA DOĞU", Some("SETUR")),
        ]
    );

    assert_eq!(rows[0].measure("eur_revenue"), Numeric::Value(7000.5));
    assert_eq!(rows[2].measure("eur_avg_perpaidpax"), Numeric::Value(71.4));
    assert!(rows[3].measure("eur_revenue").is_missing());
    assert!(rows[3].measure("eur_avg_perpaidpax").is_missing());
    assert_eq!(output.stats.market_headers, 3);
    assert_eq!(output.stats.noise_rows, 2);

    Ok(())
}

#[test]
fn test_reference_conflicts_are_reported() -> Result<()> {
    let csv = "Region;Country\nEUROPE;CYPRUS\nMIDDLE EAST;CYPRUS\n";
    let index = load_reference_index(&grid_from_csv(csv)?)?;

    assert_eq!(index.region_for_exact("CYPRUS"), Some("Middle East"));
    assert_eq!(index.conflicts().len(), 1);
    assert_eq!(index.conflicts()[0].replaced_region, "Europe");
    Ok(())
}

#[test]
fn test_row_order_drives_context() -> Result<()> {
    let reference = reference()?;
    let config = ParserConfig::region_country_report();

    let mut grid = grid_from_csv("AgencyGroup;Arrival Room\n01-JANUARY;\nJAPAN;\nHIS-OSAKA;1\nGERMANY;\n")?;
    let forward = process_sectioned_report(&grid, &config, Some(&reference))?;
    assert_eq!(forward.rows[0].country.as_deref(), Some("Japan"));

    // Moving the data row below the second banner re-roots it.
    grid.swap(3, 4);
    let swapped = process_sectioned_report(&grid, &config, Some(&reference))?;
    assert_eq!(swapped.rows[0].country.as_deref(), Some("Germany"));
    Ok(())
}

#[test]
fn test_parallel_parses_share_reference() -> Result<()> {
    let reference = reference()?;
    let grid = grid_from_csv(NATIONALITY_CSV)?;
    let config = ParserConfig::region_country_report();

    let expected = process_sectioned_report(&grid, &config, Some(&reference))?.to_json()?;

    let outputs: Vec<String> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    process_sectioned_report(&grid, &config, Some(&reference))
                        .and_then(|output| output.to_json())
                })
            })
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().expect("parse thread panicked"))
            .collect::<std::result::Result<Vec<_>, _>>()
    })?;

    for output in outputs {
        assert_eq!(output, expected);
    }
    Ok(())
}

#[test]
fn test_config_from_json() -> Result<()> {
    let json = r#"{
        "hierarchy": "market_only",
        "header_row": { "column": 0, "matcher": { "match": "exact", "text": "Agency" } },
        "primary_column": "agency",
        "header_labels": [ { "label": "NORTH", "canonical": "N" } ],
        "group_rules": [ { "label": "ANEX", "patterns": ["ANEX-"] } ],
        "fallback_group": "OTHER",
        "group_entities": true,
        "numeric": {
            "columns": { "listed": ["arrival_room"] },
            "convention": "decimal_comma",
            "missing": "zero"
        }
    }"#;
    let config = ParserConfig::from_json(json)?;

    let grid = grid_from_csv("Agency;Arrival Room\n05-MAY;\nNORTH;\nANEX-1;2,5\nSETUR-1;\n")?;
    let output = process_sectioned_report(&grid, &config, None)?;

    assert_eq!(output.rows.len(), 2);
    assert_eq!(output.rows[0].market_or_region, "N");
    assert_eq!(output.rows[0].entity_group.as_deref(), Some("ANEX"));
    assert_eq!(output.rows[0].measure("arrival_room"), Numeric::Value(2.5));
    assert_eq!(output.rows[1].entity_group.as_deref(), Some("OTHER"));
    assert_eq!(output.rows[1].measure("arrival_room"), Numeric::Value(0.0));
    Ok(())
}

#[test]
fn test_report_without_header_row_fails() -> Result<()> {
    let grid = grid_from_csv("Agency;Room\nANEX-1;1\n")?;
    let config = ParserConfig::region_country_report();
    let reference = reference()?;

    let err = process_sectioned_report(&grid, &config, Some(&reference)).unwrap_err();
    assert!(matches!(err, SectionParseError::HeaderRowNotFound { .. }));
    assert!(err.to_string().contains("AgencyGroup"));
    Ok(())
}
