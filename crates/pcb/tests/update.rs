use assert_cmd::Command;
use assert_fs::TempDir;
use assert_fs::prelude::*;
use pcb_netsync::geometry::{Point, mm};
use pcb_netsync::layer::{Layer, LayerSet};
use pcb_netsync::{Board, Component, ComponentNet, Footprint, LibId, Netlist, Pad};
use serde::Serialize;
use std::path::Path;

fn write_json<T: Serialize>(dir: &TempDir, name: &str, value: &T) {
    dir.child(name)
        .write_str(&serde_json::to_string_pretty(value).unwrap())
        .unwrap();
}

/// Workspace with an empty board, a two resistor netlist and a library
/// holding `R/R_0603.json`.
fn workspace(fpid: &str) -> TempDir {
    let dir = TempDir::new().unwrap();

    let mut fp = Footprint::new(LibId::from("R:R_0603"), "REF**");
    for n in 0..2 {
        let mut pad = Pad::new((n + 1).to_string(), LayerSet::single(Layer::F_CU));
        pad.position = Point::new(mm(2) * n, 0);
        fp.pads.push(pad);
    }
    write_json(&dir, "lib/R/R_0603.json", &fp);

    let components = ["R1", "R2"]
        .iter()
        .map(|r| {
            let mut c = Component::new(*r, "10k", LibId::from(fpid));
            c.pins = vec![ComponentNet::new("1", "VCC"), ComponentNet::new("2", "GND")];
            c
        })
        .collect();
    write_json(&dir, "netlist.json", &Netlist::new(components));
    write_json(&dir, "board.json", &Board::new());
    dir
}

fn update(dir: &TempDir, extra: &[&str]) -> Command {
    let mut cmd = Command::cargo_bin("pcb").unwrap();
    cmd.current_dir(dir.path())
        .env("NO_COLOR", "1")
        .args([
            "update",
            "--board",
            "board.json",
            "--netlist",
            "netlist.json",
            "--library",
            "lib",
        ])
        .args(extra);
    cmd
}

fn read_board(path: &Path) -> Board {
    Board::from_json_file(path).unwrap()
}

#[test]
fn update_writes_board() {
    let dir = workspace("R:R_0603");

    let output = update(&dir, &[]).assert().success().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("action: Add R1 (footprint \"R:R_0603\")."));
    assert!(stdout.contains("Total warnings: 0, errors: 0."));

    let board = read_board(&dir.path().join("board.json"));
    assert_eq!(board.footprints.len(), 2);
    let r2 = &board.footprints[1];
    assert_eq!(r2.reference, "R2");
    assert_eq!(board.net_name(r2.pads[0].net), "VCC");
    assert_eq!(board.net_name(r2.pads[1].net), "GND");
}

#[test]
fn output_leaves_input_alone() {
    let dir = workspace("R:R_0603");

    update(&dir, &["-o", "out.json"]).assert().success();

    assert!(read_board(&dir.path().join("board.json")).footprints.is_empty());
    assert_eq!(read_board(&dir.path().join("out.json")).footprints.len(), 2);
}

#[test]
fn dry_run_does_not_write() {
    let dir = workspace("R:R_0603");
    let before = std::fs::read_to_string(dir.path().join("board.json")).unwrap();

    let output = update(&dir, &["--dry-run", "--json"])
        .assert()
        .success()
        .get_output()
        .clone();

    let after = std::fs::read_to_string(dir.path().join("board.json")).unwrap();
    assert_eq!(before, after);

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["new_footprints"], 2);
    assert_eq!(report["summary"]["errors"], 0);
}

#[test]
fn missing_footprint_fails() {
    let dir = workspace("R:R_9999");

    let output = update(&dir, &[]).assert().failure().get_output().clone();
    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stdout.contains("error: Cannot add R1 (footprint \"R:R_9999\" not found)."));
    assert!(stderr.contains("Error: Update finished with 2 errors"));
}

#[test]
fn config_file_is_applied() {
    let dir = workspace("R:R_0603");
    dir.child("sync.toml").write_str("dry_run = true\n").unwrap();

    update(&dir, &["--config", "sync.toml"]).assert().success();

    assert!(read_board(&dir.path().join("board.json")).footprints.is_empty());
}
