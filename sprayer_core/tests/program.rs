use sprayer_core::{
    Command, DoseTuning, FlowModel, GcodeWriter, GeometryConfig, ProgramAssembler,
    SprayParameters, TravelFormula, ValvePorts,
};
use rstest::{fixture, rstest};

#[fixture]
fn assembler() -> ProgramAssembler {
    ProgramAssembler::builder()
        .with_geometry(GeometryConfig::default())
        .build()
        .unwrap()
}

fn reference() -> SprayParameters {
    SprayParameters {
        distance: 10.0,
        height: 50.0,
        speed: 10.0,
        flow: 10.0,
        cycles: 1,
        delay: 0.0,
        solution: 3,
    }
}

#[rstest]
fn program_starts_with_valve_and_ends_homed(assembler: ProgramAssembler) {
    let program = assembler.assemble(&reference()).unwrap();
    let cmds = program.commands();
    assert_eq!(cmds[0], Command::SelectValve(3));
    assert_eq!(
        &cmds[cmds.len() - 2..],
        &[Command::Home, Command::MotorsOff]
    );
}

#[rstest]
#[case(1)]
#[case(2)]
#[case(5)]
fn each_cycle_rasters_two_l_minus_one_dispenses(assembler: ProgramAssembler, #[case] cycles: u32) {
    let program = assembler
        .assemble(&SprayParameters {
            cycles,
            ..reference()
        })
        .unwrap();
    assert_eq!(program.count(Command::is_dispense), cycles as usize * (2 * 16 - 1));
}

#[rstest]
#[case::single_cycle(1, 0)]
#[case::two_cycles(2, 1)]
#[case::four_cycles(4, 3)]
fn delay_only_between_cycles(
    assembler: ProgramAssembler,
    #[case] cycles: u32,
    #[case] pauses: usize,
) {
    let delay = 7.5;
    let program = assembler
        .assemble(&SprayParameters {
            cycles,
            delay,
            ..reference()
        })
        .unwrap();
    assert_eq!(program.count(|c| *c == Command::Dwell(delay)), pauses);
}

#[rstest]
fn zero_delay_emits_no_pause(assembler: ProgramAssembler) {
    let program = assembler
        .assemble(&SprayParameters {
            cycles: 3,
            ..reference()
        })
        .unwrap();
    assert_eq!(program.count(|c| *c == Command::Dwell(0.0)), 0);
}

#[rstest]
fn cycles_interlace_instead_of_repeating(assembler: ProgramAssembler) {
    let program = assembler
        .assemble(&SprayParameters {
            cycles: 2,
            ..reference()
        })
        .unwrap();
    let ys: Vec<f64> = program
        .iter()
        .filter_map(|c| match c {
            Command::Dispense { y, .. } => Some(*y),
            _ => None,
        })
        .collect();
    // first cycle starts at y1, second one shifted by 10 / 16
    assert_eq!(ys[0], -80.0);
    assert_eq!(ys[31], -80.0 + 0.625);
}

#[rstest]
fn raster_serpentines_across_the_work_area(assembler: ProgramAssembler) {
    let program = assembler.assemble(&reference()).unwrap();
    let moves: Vec<(f64, f64)> = program
        .iter()
        .filter_map(|c| match c {
            Command::Dispense { x, y, .. } => Some((*x, *y)),
            _ => None,
        })
        .collect();
    assert_eq!(moves[0], (60.0, -80.0));
    assert_eq!(moves[1], (60.0, -70.0));
    assert_eq!(moves[2], (-60.0, -70.0));
    assert_eq!(moves.last(), Some(&(-60.0, 70.0)));
}

#[rstest]
fn dispensed_plunger_travel_stays_within_intake(assembler: ProgramAssembler) {
    let params = reference();
    let profile = assembler.plan(&params).unwrap();
    let program = assembler.assemble(&params).unwrap();
    let dispensed: f64 = program
        .iter()
        .filter_map(|c| match c {
            Command::Dispense { plunger_delta, .. } => Some(-plunger_delta),
            _ => None,
        })
        .sum();
    assert!(dispensed > 0.0);
    assert!(dispensed <= profile.plunger_travel_total + 1e-9);
}

#[rstest]
fn cycle_routes_syringe_through_head_before_dispensing(assembler: ProgramAssembler) {
    let program = assembler.assemble(&reference()).unwrap();
    let cmds = program.commands();
    let first_dispense = cmds.iter().position(Command::is_dispense).unwrap();
    let before = &cmds[..first_dispense];
    let last_valve = before
        .iter()
        .rev()
        .find_map(|c| match c {
            Command::SelectValve(p) => Some(*p),
            _ => None,
        })
        .unwrap();
    assert_eq!(last_valve, 2);
    assert_eq!(before.last(), Some(&Command::SyringeRelativeMode));
    // hover height is measured down from the top reference
    assert!(before.contains(&Command::MoveZ {
        z: -50.0,
        feed: 200.0
    }));
}

#[test]
fn rev2_layout_uses_its_own_head_port() {
    let geometry = GeometryConfig {
        valves: ValvePorts {
            waste: 0,
            wash: 2,
            head: 1,
            solutions: vec![3, 4],
        },
        ..GeometryConfig::default()
    };
    let assembler = ProgramAssembler::builder()
        .with_geometry(geometry)
        .build()
        .unwrap();
    let program = assembler.assemble(&reference()).unwrap();
    let cmds = program.commands();
    let first_dispense = cmds.iter().position(Command::is_dispense).unwrap();
    assert_eq!(cmds[first_dispense - 2], Command::SelectValve(1));
}

#[rstest]
#[case::single_return(TravelFormula::SingleReturn, 2080.0)]
#[case::double_return(TravelFormula::DoubleReturn, 2240.0)]
fn travel_formula_is_configurable(#[case] travel_formula: TravelFormula, #[case] travel: f64) {
    let assembler = ProgramAssembler::builder()
        .with_geometry(GeometryConfig::default())
        .with_tuning(DoseTuning {
            travel_formula,
            ..DoseTuning::default()
        })
        .build()
        .unwrap();
    let profile = assembler.plan(&reference()).unwrap();
    assert_eq!(profile.travel_distance, travel);
}

#[test]
fn areal_flow_scales_with_pitch() {
    let assembler = ProgramAssembler::builder()
        .with_geometry(GeometryConfig::default())
        .with_tuning(DoseTuning {
            flow_model: FlowModel::Areal,
            ..DoseTuning::default()
        })
        .build()
        .unwrap();
    let profile = assembler
        .plan(&SprayParameters {
            flow: 0.001,
            ..reference()
        })
        .unwrap();
    // 0.001 ul/mm² over a 10 mm pitch
    assert!((profile.linear_density - 0.01).abs() < 1e-12);
    assert!((profile.total_volume - 20.8).abs() < 1e-9);
}

#[rstest]
fn identical_inputs_give_identical_text(assembler: ProgramAssembler) {
    let params = SprayParameters {
        cycles: 3,
        delay: 2.0,
        ..reference()
    };
    let writer = GcodeWriter::new(*assembler.format());
    let a = writer.render(&assembler.assemble(&params).unwrap());
    let b = writer.render(&assembler.assemble(&params).unwrap());
    assert_eq!(a, b);
    assert_eq!(assembler.plan(&params).unwrap(), assembler.plan(&params).unwrap());
}

#[rstest]
fn session_ends_with_wash_prime_and_purge(assembler: ProgramAssembler) {
    let program = assembler.assemble(&reference()).unwrap();
    // homed after wash, at the start of prime and of purge, and at the end
    assert_eq!(program.count(|c| *c == Command::Home), 4);
    assert_eq!(program.count(|c| *c == Command::MotorsOff), 2);
    // four dry pulses during wash
    assert_eq!(program.count(|c| *c == Command::Dwell(2.0)), 4);
}
