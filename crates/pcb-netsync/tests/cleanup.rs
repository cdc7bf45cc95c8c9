use pcb_netsync::geometry::Point;
use pcb_netsync::{Board, FootprintAttributes, NetCode, Netlist, Severity, UpdateOptions};

mod helpers;
use helpers::*;

fn netlist() -> Netlist {
    Netlist::new(vec![
        component("R1", "R:R_0603", &[("1", "VCC"), ("2", "OUT")]),
        component("R2", "R:R_0603", &[("1", "OUT"), ("2", "GND")]),
        component("C1", "C:C_0603", &[("1", "VCC"), ("2", "GND")]),
    ])
}

/// Every remaining net is either the sentinel or bound to a pad.
fn assert_nets_live(board: &Board) {
    for net in board.nets.iter() {
        if net.code.is_unconnected() {
            continue;
        }
        assert!(
            board.pads().any(|(_, pad)| pad.net == net.code),
            "net {} has no pads",
            net.name
        );
    }
}

#[test]
fn renamed_nets_are_swept() {
    let mut board = build_board(&netlist());

    let mut renamed = netlist();
    for c in &mut renamed.components {
        for pin in &mut c.pins {
            if pin.net == "OUT" {
                pin.net = "SIG".into();
            }
        }
    }

    let result = run(&mut board, &renamed, UpdateOptions::default());

    assert!(result.log.contains("Remove unused net \"OUT\"."));
    let mut names: Vec<_> = board.nets.iter().map(|n| n.name.clone()).collect();
    names.sort();
    assert_eq!(names, vec!["", "GND", "SIG", "VCC"]);
    assert_nets_live(&board);
}

#[test]
fn single_pad_net_is_cleared() {
    let mut nl = netlist();
    nl.components[0].pins[1].net = "LONELY".into();
    nl.components[1].pins[0].net = "GND".into();
    let mut board = build_board(&nl);

    let result = run(&mut board, &nl, UpdateOptions::default());

    assert_eq!(
        result.actions(),
        vec!["Remove single pad net LONELY.", "Remove unused net \"LONELY\"."]
    );
    assert_eq!(pad_net(&board, "R1", "2"), "");
    assert!(board.nets.find("LONELY").is_none());
    assert_nets_live(&board);

    // the pad stays unconnected from now on
    let again = run(&mut board, &nl, UpdateOptions::default());
    assert!(again.actions().is_empty(), "{:?}", again.actions());
}

#[test]
fn single_pad_net_with_zone_is_kept() {
    let mut nl = netlist();
    nl.components[0].pins[1].net = "LONELY".into();
    nl.components[1].pins[0].net = "GND".into();
    let mut board = build_board(&nl);
    zone_around(&mut board, Point::new(0, 0), 1, "LONELY");

    let result = run(&mut board, &nl, UpdateOptions::default());

    assert!(result.actions().is_empty(), "{:?}", result.actions());
    assert_eq!(pad_net(&board, "R1", "2"), "LONELY");
}

#[test]
fn single_pad_nets_survive_when_disabled() {
    let mut nl = netlist();
    nl.components[0].pins[1].net = "LONELY".into();
    nl.components[1].pins[0].net = "GND".into();
    let mut board = build_board(&nl);

    let options = UpdateOptions {
        delete_single_pad_nets: false,
        ..Default::default()
    };
    let result = run(&mut board, &nl, options);

    assert!(result.actions().is_empty());
    assert_eq!(pad_net(&board, "R1", "2"), "LONELY");
}

#[test]
fn unused_footprints_are_removed_unless_locked() {
    let mut with_extra = netlist();
    with_extra
        .components
        .push(component("U1", "U:SOIC-8", &[("1", "VCC"), ("2", "GND")]));
    with_extra
        .components
        .push(component("U2", "U:SOIC-8", &[("1", "VCC"), ("2", "GND")]));
    with_extra
        .components
        .push(component("MH1", "C:C_0603", &[]));
    let mut board = build_board(&with_extra);
    board
        .footprints
        .iter_mut()
        .find(|fp| fp.reference == "U1")
        .unwrap()
        .locked = true;
    board
        .footprints
        .iter_mut()
        .find(|fp| fp.reference == "MH1")
        .unwrap()
        .attributes = FootprintAttributes::BOARD_ONLY;

    let options = UpdateOptions {
        delete_unused_footprints: true,
        ..Default::default()
    };
    let result = run(&mut board, &netlist(), options);

    assert_eq!(result.summary.warnings, 1);
    assert_eq!(
        result.log.messages(Severity::Warning),
        vec!["Cannot remove unused footprint U1 (locked)."]
    );
    assert!(result.log.contains("Remove unused footprint U2."));

    let refs: Vec<_> = board.footprints.iter().map(|fp| fp.reference.as_str()).collect();
    assert_eq!(refs, vec!["R1", "R2", "C1", "U1", "MH1"]);
    assert_eq!(pad_net(&board, "U1", "1"), "VCC");
    assert_nets_live(&board);
}

#[test]
fn excluded_components_count_as_unused() {
    let mut nl = netlist();
    nl.components.push(component("TP1", "C:C_0603", &[("1", "GND")]));
    let mut board = build_board(&nl);

    nl.components[3]
        .properties
        .insert(pcb_netsync::netlist::EXCLUDE_FROM_BOARD.into(), String::new());

    let options = UpdateOptions {
        delete_unused_footprints: true,
        ..Default::default()
    };
    let result = run(&mut board, &nl, options);

    assert!(!result.log.contains("Processing symbol 'TP1:C:C_0603'."));
    assert!(result.log.contains("Remove unused footprint TP1."));
    assert_eq!(board.footprints.len(), 3);
}

#[test]
fn kept_footprint_keeps_net_alive() {
    let nl = Netlist::new(vec![
        component("R1", "R:R_0603", &[("1", "SENSE"), ("2", "VCC")]),
        component("C1", "C:C_0603", &[("1", "VCC"), ("2", "GND")]),
        component("C2", "C:C_0603", &[("1", "VCC"), ("2", "GND")]),
    ]);
    // TP1 sits on SENSE but has no symbol
    let mut with_tp = nl.clone();
    with_tp
        .components
        .push(component("TP1", "C:C_0603", &[("1", "SENSE")]));
    let mut board = build_board(&with_tp);
    board.footprints[0].pads[0].net = NetCode::UNCONNECTED;

    let result = run(&mut board, &nl, UpdateOptions::default());

    assert_eq!(result.actions(), vec!["Connect R1 pin 1 to SENSE."]);
    assert_eq!(pad_net(&board, "R1", "1"), "SENSE");
    assert_eq!(pad_net(&board, "TP1", "1"), "SENSE");
    assert_nets_live(&board);

    let again = run(&mut board, &nl, UpdateOptions::default());
    assert!(again.actions().is_empty(), "{:?}", again.actions());
}

#[test]
fn dry_run_announces_new_net_once() {
    let mut with_tp = netlist();
    with_tp
        .components
        .push(component("TP1", "C:C_0603", &[("1", "OUT"), ("2", "OUT")]));
    let mut board = build_board(&with_tp);
    let before = board.clone();

    let mut renamed = netlist();
    for c in &mut renamed.components {
        for pin in &mut c.pins {
            if pin.net == "OUT" {
                pin.net = "SIG".into();
            }
        }
    }
    let dry = UpdateOptions {
        dry_run: true,
        ..Default::default()
    };
    let preview = run(&mut board, &renamed, dry);

    assert_eq!(board, before);
    assert_eq!(
        preview
            .actions()
            .iter()
            .filter(|a| a.starts_with("Add net"))
            .collect::<Vec<_>>(),
        vec![&"Add net SIG."]
    );
    assert!(preview.log.contains("Reconnect R1 pin 2 from OUT to SIG."));
    assert!(preview.log.contains("Reconnect R2 pin 1 from OUT to SIG."));

    run(&mut board, &renamed, UpdateOptions::default());
    // TP1 holds OUT on the board
    assert_eq!(pad_net(&board, "TP1", "1"), "OUT");
    assert_eq!(pad_net(&board, "TP1", "2"), "OUT");
    assert_nets_live(&board);
}
