use rstest::rstest;
use sprayer_config::{FlowModel, TravelFormula, ValveLayout, ValvePorts, load_toml};

const MINIMAL: &str = r#"
[geometry]
x1 = -60
x2 = 60
y1 = -80
y2 = 80
top = 100
"#;

#[rstest]
fn minimal_config_fills_defaults() {
    let cfg = load_toml(MINIMAL).expect("parse TOML");
    cfg.validate().expect("defaults are valid");

    assert_eq!(cfg.syringe.volume_per_travel, 5.0);
    assert_eq!(cfg.dose.feed_factor, 4.0);
    assert_eq!(cfg.dose.flow_model, FlowModel::TimeBased);
    assert_eq!(cfg.dose.travel_formula, TravelFormula::SingleReturn);
    assert_eq!(cfg.feeds.rapid, 200.0);
    assert_eq!(cfg.geometry.wash.y, -110.0);
    assert_eq!(
        cfg.valves.resolve().unwrap(),
        ValvePorts {
            waste: 0,
            wash: 1,
            head: 2,
            solutions: vec![3, 4],
        }
    );
}

#[rstest]
fn full_config_parses() {
    let toml = r#"
[geometry]
x1 = -50
x2 = 50
y1 = -70
y2 = 70
top = 120
home = { x = 1, y = 2, z = 3 }
wash = { x = 5, y = -100, approach_z = -20, final_z = -45 }

[syringe]
volume_per_travel = 2.5
max_plunger_travel = 60
max_volume = 150

[valves]
layout = "rev2"
solutions = [4, 5, 6]

[dose]
feed_factor = 6.0
flow_model = "areal"
travel_formula = "double_return"

[feeds]
rapid = 300
head_flush = 12

[maintenance]
purge_repeats = 5
dry_pulses = 2

[output]
precision = 3
valve_settle_s = 0.5
header = false
max_commands = 5000

[logging]
level = "debug"
rotation = "daily"
"#;
    let cfg = load_toml(toml).expect("parse TOML");
    cfg.validate().expect("valid config");
    assert_eq!(cfg.valves.layout, ValveLayout::Rev2);
    let ports = cfg.valves.resolve().unwrap();
    assert_eq!((ports.waste, ports.wash, ports.head), (0, 2, 1));
    assert_eq!(cfg.dose.flow_model, FlowModel::Areal);
    assert_eq!(cfg.dose.travel_formula, TravelFormula::DoubleReturn);
    assert_eq!(cfg.geometry.home.z, 3.0);
    assert_eq!(cfg.geometry.wash.final_z, -45.0);
    assert_eq!(cfg.maintenance.purge_repeats, 5);
    assert!(!cfg.output.header);
    assert_eq!(cfg.output.max_commands, 5000);
}

#[rstest]
fn persisted_calibration_overrides_syringe() {
    let toml = format!("{MINIMAL}\n[calibration]\nvolume_per_travel = 4.2\n");
    let cfg = load_toml(&toml).unwrap();
    assert_eq!(cfg.volume_per_travel(), 4.2);
}

#[rstest]
fn explicit_ports_override_layout() {
    let toml = format!("{MINIMAL}\n[valves]\nlayout = \"rev1\"\nwash = 7\nsolutions = [3]\n");
    let cfg = load_toml(&toml).unwrap();
    let ports = cfg.valves.resolve().unwrap();
    assert_eq!((ports.waste, ports.wash, ports.head), (0, 7, 2));
}

#[rstest]
#[case("[geometry]\nx1 = 60\nx2 = -60\ny1 = -80\ny2 = 80\ntop = 100\n", "geometry.x1 must be < geometry.x2")]
#[case("[geometry]\nx1 = -60\nx2 = 60\ny1 = 80\ny2 = 80\ntop = 100\n", "geometry.y1 must be < geometry.y2")]
#[case("[syringe]\nvolume_per_travel = 0.0\n", "syringe.volume_per_travel must be > 0")]
#[case("[syringe]\nmax_plunger_travel = 8.0\n", "exceeds syringe.max_plunger_travel")]
#[case("[valves]\nsolutions = []\n", "valves.solutions must list at least one port")]
#[case("[valves]\nsolutions = [1]\n", "collides with waste/wash/head")]
#[case("[valves]\nsolutions = [3, 3]\n", "lists port 3 twice")]
#[case("[valves]\nhead = 0\n", "must be distinct")]
#[case("[dose]\nfeed_factor = 0.0\n", "dose.feed_factor must be > 0")]
#[case("[dose]\nseconds_per_unit = 0.0\n", "dose.seconds_per_unit must be > 0")]
#[case("[feeds]\nrapid = -1.0\n", "feeds.rapid must be > 0")]
#[case("[maintenance]\ndrip_travel = 10.0\n", "drip_travel must be < maintenance.wash_travel")]
#[case("[maintenance]\npurge_repeats = 0\n", "purge_repeats must be >= 1")]
#[case("[output]\nprecision = 20\n", "output.precision")]
#[case("[output]\nmax_commands = 0\n", "output.max_commands must be >= 1")]
#[case("[logging]\nrotation = \"weekly\"\n", "logging.rotation")]
fn rejects_invalid_sections(#[case] extra: &str, #[case] needle: &str) {
    // geometry cases replace the minimal block, the rest append to it
    let toml = if extra.starts_with("[geometry]") {
        extra.to_string()
    } else {
        format!("{MINIMAL}\n{extra}")
    };
    let cfg = load_toml(&toml).expect("parse TOML");
    let err = cfg.validate().expect_err("should be rejected");
    assert!(
        format!("{err}").contains(needle),
        "expected '{needle}' in '{err}'"
    );
}

#[rstest]
fn missing_geometry_is_a_parse_error() {
    assert!(load_toml("[syringe]\nvolume_per_travel = 5.0\n").is_err());
}

#[rstest]
fn unknown_layout_is_a_parse_error() {
    let toml = format!("{MINIMAL}\n[valves]\nlayout = \"rev9\"\n");
    assert!(load_toml(&toml).is_err());
}
