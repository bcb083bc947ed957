use std::fs;
use std::io::Write;

use analog_sim::output::OutputFormat;
use analog_sim::simulator::{AnalysisType, SimulationResult};
use analog_sim::*;
use tempfile::NamedTempFile;

fn write_netlist(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(json.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn simulate_op(json: &str) -> SimulationResult {
    let file = write_netlist(json);
    let mut simulator = Simulator::new();
    simulator.load_netlist(file.path()).unwrap();
    simulator.run_operating_point().unwrap();
    simulator.get_results().unwrap().clone()
}

const RC_STEP: &str = r#"[
    ["analog:ground", {"gnd": "gnd"}],
    ["analog:v", {"nplus": "in", "nminus": "gnd"}, {"name": "Vin", "value": "step(0,1,0,1n)"}],
    ["analog:r", {"n1": "in", "n2": "out"}, {"r": "1k"}],
    ["analog:c", {"n1": "out", "n2": "gnd"}, {"c": "1u"}],
    ["analog:vprobe", {"probe": "out"}, {"color": "red"}]
]"#;

#[test]
fn test_inverting_amplifier() {
    let results = simulate_op(
        r#"[
        ["g", {"gnd": "0"}],
        ["v", {"nplus": "in", "nminus": "0"}, {"name": "Vin", "value": 0.1}],
        ["r", {"n1": "in", "n2": "inv"}, {"r": "1k"}],
        ["r", {"n1": "inv", "n2": "out"}, {"r": "10k"}],
        ["o", {"nplus": "0", "nminus": "inv", "output": "out", "gnd": "0"}, {"A": 100000}]
    ]"#,
    );

    let gain = results.final_value("out").unwrap() / 0.1;
    assert!((gain + 10.0).abs() < 1e-2, "gain {}", gain);
    assert!(results.final_value("inv").unwrap().abs() < 1e-4);
}

#[test]
fn test_nfet_pulls_output_low() {
    let netlist = |gate: &str| {
        format!(
            r#"[
            ["g", {{"gnd": "0"}}],
            ["v", {{"nplus": "vdd", "nminus": "0"}}, {{"value": "2.5"}}],
            ["v", {{"nplus": "gate", "nminus": "0"}}, {{"value": "{}"}}],
            ["r", {{"n1": "vdd", "n2": "out"}}, {{"r": "100k"}}],
            ["nfet", {{"D": "out", "G": "gate", "S": "0"}}, {{"W": 8, "L": 2}}]
        ]"#,
            gate
        )
    };

    let on = simulate_op(&netlist("2.5"));
    assert!(on.final_value("out").unwrap() < 0.1);

    let off = simulate_op(&netlist("0"));
    assert!((off.final_value("out").unwrap() - 2.5).abs() < 1e-6);
}

#[test]
fn test_cmos_inverter() {
    let netlist = |input: f64| {
        format!(
            r#"[
            ["g", {{"gnd": "0"}}],
            ["v", {{"nplus": "vdd", "nminus": "0"}}, {{"value": 2.5}}],
            ["v", {{"nplus": "in", "nminus": "0"}}, {{"value": {}}}],
            ["pfet", {{"D": "out", "G": "in", "S": "vdd"}}, {{"W": 16, "L": 2}}],
            ["nfet", {{"D": "out", "G": "in", "S": "0"}}, {{"W": 8, "L": 2}}],
            ["c", {{"n1": "out", "n2": "0"}}, {{"c": "10f"}}]
        ]"#,
            input
        )
    };

    assert!((simulate_op(&netlist(0.0)).final_value("out").unwrap() - 2.5).abs() < 1e-3);
    assert!(simulate_op(&netlist(2.5)).final_value("out").unwrap().abs() < 1e-3);
}

#[test]
fn test_current_probe_reports_branch_current() {
    let results = simulate_op(
        r#"[
        ["g", {"gnd": "0"}],
        ["i", {"nplus": "0", "nminus": "a"}, {"value": "2m"}],
        ["a", {"nplus": "a", "nminus": "b"}, {"name": "Ia"}],
        ["r", {"n1": "b", "n2": "0"}, {"r": "500"}]
    ]"#,
    );

    assert!((results.final_value("a").unwrap() - 1.0).abs() < 1e-6);
    assert!((results.final_value("I(Ia)").unwrap() - 2e-3).abs() < 1e-9);
}

#[test]
fn test_rc_transient_through_simulator() {
    let file = write_netlist(RC_STEP);
    let mut simulator = Simulator::new();
    simulator.load_netlist(file.path()).unwrap();
    simulator.run_transient(10e-3, 100, &["out".to_string()]).unwrap();

    let results = simulator.get_results().unwrap();
    assert!(results.success);
    assert_eq!(results.axis.as_deref(), Some(TransientResult::TIME));
    assert!((results.final_value("out").unwrap() - 1.0).abs() < 1e-3);
    assert!(results.signals["gnd"].iter().all(|&v| v == 0.0));
    assert_eq!(results.signals["I(Vin)"].len(), results.len());
}

#[test]
fn test_square_wave_settles_to_half() {
    // 1 kHz square wave into a 10 ms RC: output averages half the swing
    let file = write_netlist(
        r#"[
        ["g", {"gnd": "0"}],
        ["v", {"nplus": "in", "nminus": "0"}, {"value": "square(0,1,1k)"}],
        ["r", {"n1": "in", "n2": "out"}, {"r": "10k"}],
        ["c", {"n1": "out", "n2": "0"}, {"c": "1u"}]
    ]"#,
    );
    let mut simulator = Simulator::new();
    simulator.load_netlist(file.path()).unwrap();
    simulator.run_transient(50e-3, 50, &[]).unwrap();

    let results = simulator.get_results().unwrap();
    let out = results.final_value("out").unwrap();
    assert!(out > 0.4 && out < 0.6, "out = {}", out);
}

#[test]
fn test_step_limit_reports_failure() {
    let file = write_netlist(RC_STEP);
    let config = SimulatorConfig {
        options: SimOptions {
            max_steps_per_period: 3,
            ..SimOptions::default()
        },
        ..SimulatorConfig::default()
    };
    let mut simulator = Simulator::with_config(config);
    simulator.load_netlist(file.path()).unwrap();
    simulator.run_transient(10e-3, 100, &[]).unwrap();

    let results = simulator.get_results().unwrap();
    assert!(!results.success);
    assert!(*results.axis_values().unwrap().last().unwrap() < 10e-3);
}

#[test]
fn test_ac_through_simulator() {
    let file = write_netlist(RC_STEP);
    let mut simulator = Simulator::new();
    simulator.load_netlist(file.path()).unwrap();
    simulator.run_ac(10, 1.0, 1e4, "Vin").unwrap();

    let results = simulator.get_results().unwrap();
    assert!(matches!(results.analysis_type, AnalysisType::Ac { npts: 10, .. }));
    let freqs = results.axis_values().unwrap();
    let out = &results.signals["out"];
    // Corner at 1/(2 pi RC) ~ 159 Hz, sampled at 158.5 Hz
    let corner = freqs.iter().position(|&f| f >= 158.0).unwrap();
    assert!(out[0] > 0.99);
    assert!(out[corner] < 0.75 && out[corner] > 0.65);
    assert!(results.signals.contains_key("out_phase"));
}

#[test]
fn test_export_csv_and_json() {
    let file = write_netlist(RC_STEP);
    let mut simulator = Simulator::new();
    simulator.load_netlist(file.path()).unwrap();
    simulator.run_transient(1e-3, 20, &[]).unwrap();
    let results = simulator.get_results().unwrap().clone();

    let dir = tempfile::tempdir().unwrap();
    let csv_path = dir.path().join("rc.csv");
    simulator.export_results(&csv_path, OutputFormat::Csv).unwrap();

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let header = reader.headers().unwrap().clone();
    assert_eq!(&header[0], "_time_");
    assert!(header.iter().any(|h| h == "out"));
    let rows = reader.records().count();
    assert_eq!(rows, results.len());

    let json_path = dir.path().join("rc.json");
    simulator.export_results(&json_path, OutputFormat::Json).unwrap();
    let text = fs::read_to_string(&json_path).unwrap();
    let back: SimulationResult = serde_json::from_str(&text).unwrap();
    assert_eq!(back.signals.keys().collect::<Vec<_>>(), results.signals.keys().collect::<Vec<_>>());
    for (name, series) in &results.signals {
        let read = &back.signals[name];
        assert_eq!(read.len(), series.len());
        assert!(read.iter().zip(series).all(|(a, b)| (a - b).abs() <= 1e-12 * b.abs().max(1e-12)));
    }
}

#[test]
fn test_netlist_errors() {
    let mut simulator = Simulator::new();

    let no_ground = Netlist::from_json(r#"[["r", {"n1": "a", "n2": "b"}, {"r": 1}]]"#).unwrap();
    let err = simulator.load_netlist_from_parsed(&no_ground).unwrap_err();
    assert_eq!(err.downcast_ref::<SimError>(), Some(&SimError::NoGround));

    let unknown = Netlist::from_json(r#"[["g", {"gnd": "0"}], ["xyz", {"a": "0"}]]"#).unwrap();
    let err = simulator.load_netlist_from_parsed(&unknown).unwrap_err();
    assert!(matches!(err.downcast_ref::<SimError>(), Some(SimError::UnknownDevice(kind)) if kind == "xyz"));

    let source_loop = Netlist::from_json(
        r#"[
        ["g", {"gnd": "0"}],
        ["v", {"nplus": "a", "nminus": "0"}, {"value": 1}],
        ["v", {"nplus": "a", "nminus": "0"}, {"value": 2}]
    ]"#,
    )
    .unwrap();
    let err = simulator.load_netlist_from_parsed(&source_loop).unwrap_err();
    assert_eq!(err.downcast_ref::<SimError>(), Some(&SimError::VoltageSourceLoop));

    assert!(simulator.load_netlist("/nonexistent/netlist.json").is_err());
}

#[test]
fn test_options_file_overrides() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(br#"{"reltol": 1e-3, "max_tran_iters": 30}"#).unwrap();
    file.flush().unwrap();

    let config = SimulatorConfig::from_options_file(file.path()).unwrap();
    assert_eq!(config.options.reltol, 1e-3);
    assert_eq!(config.options.max_tran_iters, 30);
    assert_eq!(config.options.dc_max_iters, SimOptions::default().dc_max_iters);
}
