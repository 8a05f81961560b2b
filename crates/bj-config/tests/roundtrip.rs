use bj_config::schema::*;
use bj_config::{ConfigError, load_config, save_config, validate_config};

#[test]
fn roundtrip_yaml_default_config() {
    let config = RunConfig::default();
    validate_config(&config).unwrap();

    let path = std::env::temp_dir().join("bj_config_roundtrip_default.yaml");
    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_json_custom_grid() {
    let mut config = RunConfig::default();
    config.name = "stiff cords".to_string();
    config.grid.stiffness_n_per_m = AxisDef::Values(vec![100.0, 150.0, 200.0]);
    config.grid.loss_factor = AxisDef::Linspace {
        start: 0.1,
        end: 0.3,
        count: 3,
        decimals: None,
    };
    config.solver.method = SolverMethod::Rk4;
    config.solver.max_wall_time_s = Some(5.0);

    let path = std::env::temp_dir().join("bj_config_roundtrip_custom.json");
    save_config(&path, &config).unwrap();
    let loaded = load_config(&path).unwrap();

    assert_eq!(config, loaded);
    assert_eq!(loaded.stiffness_values().len() * loaded.loss_factor_values().len(), 9);
}

#[test]
fn partial_yaml_falls_back_to_defaults() {
    let yaml = "\
name: short horizon
time:
  t_end_s: 5.0
grid:
  stiffness_n_per_m: [50.0, 80.0]
solver:
  method: euler
  dt_s: 0.0005
";
    let config: RunConfig = serde_yaml::from_str(yaml).unwrap();
    validate_config(&config).unwrap();

    assert_eq!(config.version, LATEST_VERSION);
    assert_eq!(config.time.t_end_s, 5.0);
    assert_eq!(config.time.samples, 1000);
    assert_eq!(config.jumper, JumperDef::default());
    assert_eq!(config.stiffness_values(), vec![50.0, 80.0]);
    assert_eq!(config.loss_factor_values(), vec![0.15]);
    assert_eq!(config.solver.method, SolverMethod::Euler);
    assert_eq!(config.solver.max_steps, SolverDef::default().max_steps);
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let path = std::env::temp_dir().join("bj_config_invalid.yaml");
    std::fs::write(&path, "jumper:\n  mass_kg: -70.0\n").unwrap();
    let err = load_config(&path).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)), "got {err}");
}

#[test]
fn unknown_extension_is_rejected() {
    let path = std::env::temp_dir().join("bj_config.toml");
    let err = save_config(&path, &RunConfig::default()).unwrap_err();
    assert!(matches!(err, ConfigError::UnsupportedFormat { .. }));
}
