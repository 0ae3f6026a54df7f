use super::*;

fn temp_config_dir(label: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "esia-qa-config-{label}-{}",
        std::process::id()
    ));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).expect("temp config dir");
    dir
}

fn write_embedded_tables(dir: &Path) {
    fs::write(dir.join(UNITS_FILE), EMBEDDED_UNITS).expect("write units");
    fs::write(dir.join(CONTEXTS_FILE), EMBEDDED_CONTEXTS).expect("write contexts");
    fs::write(dir.join(CATEGORIES_FILE), EMBEDDED_CATEGORIES).expect("write categories");
    fs::write(dir.join(CHECKLIST_FILE), EMBEDDED_CHECKLIST).expect("write checklist");
}

#[test]
fn lowercase_millilitre_is_not_read_as_megalitre() {
    let config = AnalysisConfig::embedded().expect("embedded config should load");
    assert!(config.units.lookup("mL").is_none());
    assert!(config.units.lookup("ML/day").is_none());

    let volume = config.units.normalize("megalitres", 2.0).expect("megalitre is known");
    assert_eq!(volume.base_unit, "m3");
    assert_eq!(volume.value, 2000.0);

    let flow = config.units.normalize("Megalitre/day", 3.0).expect("megalitre/day is known");
    assert_eq!(flow.base_unit, "m3/day");
    assert_eq!(flow.value, 3000.0);
}

#[test]
fn embedded_configuration_loads_and_validates() {
    let config = AnalysisConfig::embedded().expect("embedded config should load");
    assert_eq!(config.source, ConfigSource::Embedded);
    assert!(config.units.len() >= 80, "registry has {} entries", config.units.len());
    let context_names = config
        .contexts
        .iter()
        .map(|context| context.name.as_str())
        .collect::<Vec<&str>>();
    assert!(context_names.contains(&"study_area"));
    assert!(context_names.contains(&"workforce"));
    assert!(config.checklist.item_count() > 20);
    assert_eq!(config.settings, AnalysisSettings::default());
}

#[test]
fn embedded_contexts_only_list_registered_units() {
    let config = AnalysisConfig::embedded().expect("embedded config should load");
    for context in &config.contexts {
        for unit in &context.valid_units {
            assert!(
                config.units.contains(unit),
                "context {} lists unregistered unit {unit}",
                context.name
            );
        }
    }
}

#[test]
fn directory_configuration_requires_every_table() {
    let dir = temp_config_dir("missing");
    write_embedded_tables(&dir);
    fs::remove_file(dir.join(CHECKLIST_FILE)).expect("remove checklist");

    let error = AnalysisConfig::load(Some(&dir)).expect_err("missing checklist must fail");
    assert!(
        error.to_string().contains("required configuration table missing"),
        "unexpected error: {error}"
    );
    assert!(error.to_string().contains(CHECKLIST_FILE));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn directory_configuration_defaults_optional_settings() {
    let dir = temp_config_dir("defaults");
    write_embedded_tables(&dir);

    let config = AnalysisConfig::load(Some(&dir)).expect("directory config should load");
    assert_eq!(config.source, ConfigSource::Directory(dir.clone()));
    assert_eq!(config.settings.max_evidence, 3);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn malformed_table_names_the_resource() {
    let dir = temp_config_dir("malformed");
    write_embedded_tables(&dir);
    fs::write(dir.join(CONTEXTS_FILE), "{ \"contexts\": [ { \"name\": ").expect("write");

    let error = AnalysisConfig::load(Some(&dir)).expect_err("malformed json must fail");
    assert!(error.to_string().contains(CONTEXTS_FILE), "unexpected error: {error}");

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn invalid_context_pattern_is_fatal() {
    let mut tables = embedded_tables().expect("embedded tables");
    tables.contexts.contexts[0].patterns.push("(unclosed".to_string());

    let error = AnalysisConfig::from_tables(tables, ConfigSource::Embedded)
        .expect_err("bad regex must fail");
    let chain = format!("{error:#}");
    assert!(chain.contains("invalid pattern"), "unexpected error: {chain}");
}

#[test]
fn preferred_unit_must_be_valid_for_context() {
    let mut tables = embedded_tables().expect("embedded tables");
    tables.contexts.contexts[0].preferred_unit = "mw".to_string();

    let error = AnalysisConfig::from_tables(tables, ConfigSource::Embedded)
        .expect_err("foreign preferred unit must fail");
    assert!(format!("{error:#}").contains("preferred unit"));
}

#[test]
fn duplicate_checklist_items_are_rejected() {
    let mut tables = embedded_tables().expect("embedded tables");
    let duplicate = tables.checklist.sections[0].items[0].clone();
    tables.checklist.sections[1].items.push(duplicate);

    let error = AnalysisConfig::from_tables(tables, ConfigSource::Embedded)
        .expect_err("duplicate item must fail");
    assert!(format!("{error:#}").contains("declared more than once"));
}

#[test]
fn settings_reject_inverted_thresholds() {
    let settings = AnalysisSettings {
        significance_threshold: 0.3,
        high_severity_threshold: 0.2,
        ..AnalysisSettings::default()
    };
    assert!(settings.validate().is_err());

    let partial: AnalysisSettings =
        serde_json::from_str(r#"{ "max_evidence": 5 }"#).expect("partial settings parse");
    assert_eq!(partial.max_evidence, 5);
    assert_eq!(partial.significance_threshold, 0.05);
}
