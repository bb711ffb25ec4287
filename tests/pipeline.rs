use approx::assert_abs_diff_eq;
use solar_report::cleaner::clean_data;
use solar_report::config::Config;
use solar_report::errors::{PipelineError, SourceError};
use solar_report::impact::analyze_cleaning_impact;
use solar_report::loader::load_all_regions;
use solar_report::quality::generate_quality_report;
use solar_report::recommend::generate_recommendations;
use solar_report::aggregate::calculate_regional_stats;
use solar_report::output;
use solar_report::types::{Column, Decision};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

const HEADER: &str = "Timestamp,GHI,DNI,DHI,ModA,ModB,Tamb,RH,WS,WSgust,WSstdev,WD,WDstdev,BP,Cleaning,Precipitation,TModA,TModB,Comments";

const GHI_SWING: [f64; 6] = [-10.0, -5.0, 0.0, 5.0, 10.0, 0.0];

struct Site {
    ghi_base: f64,
    dni: f64,
    tamb: f64,
    precipitation: f64,
    mod_a: Vec<f64>,
    cleaning_at: Option<usize>,
}

fn write_site(dir: &Path, name: &str, site: &Site) {
    let mut body = String::from(HEADER);
    body.push('\n');
    for (i, mod_a) in site.mod_a.iter().enumerate() {
        let ghi = site.ghi_base + GHI_SWING[i % GHI_SWING.len()];
        let cleaning = if site.cleaning_at == Some(i) { 1 } else { 0 };
        let comment = if cleaning == 1 { "panels washed" } else { "" };
        body.push_str(&format!(
            "2021-08-09 00:{:02},{},{},50,{},{},{},80,2,3,0.1,180,1,998,{},{},30,30,{}\n",
            i, ghi, site.dni, mod_a, mod_a, site.tamb, cleaning, site.precipitation, comment
        ));
    }
    fs::write(dir.join(format!("{}_solar_data.csv", name)), body).unwrap();
}

fn fixture() -> (TempDir, Config) {
    let dir = TempDir::new().unwrap();
    write_site(
        dir.path(),
        "A",
        &Site {
            ghi_base: 300.0,
            dni: 150.0,
            tamb: 25.0,
            precipitation: 0.1,
            mod_a: vec![
                100.0, 110.0, 120.0, 200.0, 200.0, 200.0, 150.0, 210.0, 210.0, 210.0, 120.0, 110.0,
            ],
            cleaning_at: Some(6),
        },
    );
    write_site(
        dir.path(),
        "B",
        &Site {
            ghi_base: 500.0,
            dni: 120.0,
            tamb: 30.0,
            precipitation: 0.0,
            mod_a: (0..12).map(|i| 400.0 + 5.0 * i as f64).collect(),
            cleaning_at: None,
        },
    );
    // Lacks the WSgust column, so the loader must skip it.
    fs::write(
        dir.path().join("Broken_solar_data.csv"),
        "Timestamp,GHI,DNI,DHI,ModA,ModB,Tamb,RH,WS,WD,Cleaning,Precipitation\n\
         2021-08-09 00:00,1,1,1,1,1,25,50,1,90,0,0\n",
    )
    .unwrap();

    let config = Config {
        data_dir: dir.path().to_path_buf(),
        output_dir: dir.path().join("processed"),
        regions: vec![
            "A".to_string(),
            "Broken".to_string(),
            "Missing".to_string(),
            "B".to_string(),
        ],
        ..Config::default()
    };
    (dir, config)
}

#[test]
fn test_full_pipeline() {
    let (_dir, config) = fixture();

    let (raw, report) = load_all_regions(&config).expect("load should succeed");
    assert_eq!(raw.len(), 24);
    assert_eq!(report.loaded.len(), 2);
    assert_eq!(report.skipped_regions(), vec!["Broken", "Missing"]);
    assert!(matches!(
        &report.skipped[0],
        PipelineError::MissingSource {
            source: SourceError::SchemaMismatch { .. },
            ..
        }
    ));

    let quality = generate_quality_report(&raw);
    assert_eq!(quality.get("GHI").unwrap().out_of_range, Some(0));
    assert_eq!(quality.get("Cleaning").unwrap().zeros, 23);
    assert_eq!(quality.get("Comments").unwrap().missing, 23);

    let cleaned = clean_data(&raw, &config.policy);
    assert_eq!(cleaned.len(), 24);
    assert!(!cleaned.is_annotated());

    let stats = calculate_regional_stats(&cleaned).unwrap();
    assert_eq!(stats["A"].ghi_mean, Some(300.0));
    assert_eq!(stats["B"].ghi_mean, Some(500.0));
    assert_eq!(stats["A"].precipitation_sum, 1.2);
    assert_eq!(stats["B"].dni_max, Some(120.0));

    let impact = analyze_cleaning_impact(&cleaned).unwrap();
    assert_eq!(impact.len(), 1);
    assert_abs_diff_eq!(impact["A"].mod_a_improvement.unwrap(), 10.0, epsilon = 1e-9);
    assert_abs_diff_eq!(impact["A"].mod_b_improvement.unwrap(), 10.0, epsilon = 1e-9);

    let rec = generate_recommendations(&cleaned).unwrap();
    assert_eq!(rec.region_for(Decision::BestOverallPotential), Some("B"));
    assert_eq!(rec.region_for(Decision::MostStableRadiation), Some("A"));
    assert_eq!(rec.region_for(Decision::LowestMaintenanceRisk), Some("B"));
    assert_eq!(rec.region_for(Decision::OptimalCspLocation), Some("A"));
}

#[test]
fn test_cleaning_is_idempotent_on_loaded_data() {
    let (_dir, config) = fixture();
    let (raw, _) = load_all_regions(&config).unwrap();
    // Default policy runs one outlier pass; on this fixture that pass
    // already rejects nothing, so a second cleaning is a no-op.
    assert!(!config.policy.converge);
    let once = clean_data(&raw, &config.policy);
    assert_eq!(once.len(), raw.len());
    let twice = clean_data(&once, &config.policy);
    assert_eq!(once, twice);
    for r in once.records() {
        for col in Column::SOLAR {
            assert!(r.value(col).unwrap() >= 0.0);
        }
    }
}

#[test]
fn test_results_are_deterministic() {
    let (_dir, config) = fixture();
    let (raw, _) = load_all_regions(&config).unwrap();
    let cleaned = clean_data(&raw, &config.policy);
    assert_eq!(
        calculate_regional_stats(&cleaned).unwrap(),
        calculate_regional_stats(&cleaned).unwrap()
    );
    assert_eq!(
        analyze_cleaning_impact(&cleaned).unwrap(),
        analyze_cleaning_impact(&cleaned).unwrap()
    );
    assert_eq!(
        generate_recommendations(&cleaned).unwrap(),
        generate_recommendations(&cleaned).unwrap()
    );
}

#[test]
fn test_no_region_available() {
    let dir = TempDir::new().unwrap();
    let config = Config {
        data_dir: dir.path().to_path_buf(),
        regions: vec!["Nowhere".to_string()],
        ..Config::default()
    };
    assert!(matches!(load_all_regions(&config), Err(PipelineError::NoData)));
}

#[test]
fn test_exports_tables() {
    let (dir, config) = fixture();
    let (raw, _) = load_all_regions(&config).unwrap();
    let cleaned = clean_data(&raw, &config.policy);
    let stats = calculate_regional_stats(&cleaned).unwrap();

    let path = dir.path().join("regional_stats.csv");
    output::write_csv(&path, &output::regional_rows(&stats)).unwrap();
    let written = fs::read_to_string(&path).unwrap();
    let mut lines = written.lines();
    assert_eq!(
        lines.next().unwrap(),
        "Region,GHI_mean,GHI_std,GHI_max,DNI_median,DNI_max,Tamb_mean,Tamb_std,WS_mean,WS_max,Precipitation_sum"
    );
    assert!(lines.next().unwrap().starts_with("A,300.00,"));
}
