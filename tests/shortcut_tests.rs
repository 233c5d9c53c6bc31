//! Shortcut expansion on data cards
//!
//! Every case drives the public parser with a whole card, so runs are
//! classified, expanded and re-rendered exactly as deck text would be.

use kerma::{ErrorKind, Value, parse_data};

/// Expanded slots of the card's data list; jumps read back as `None`.
fn expanded(data: &str) -> Vec<Option<f64>> {
    let card = format!("si1 {data}");
    let tree = parse_data(&card).unwrap();
    tree.get("data")
        .unwrap()
        .as_list()
        .unwrap()
        .values()
        .map(|node| node.value().and_then(Value::as_real))
        .collect()
}

fn assert_expands(data: &str, want: &[f64]) {
    let got = expanded(data);
    assert_eq!(got.len(), want.len(), "slot count for {data:?}: {got:?}");
    for (slot, (got, want)) in got.iter().zip(want).enumerate() {
        let got = got.unwrap_or_else(|| panic!("slot {slot} of {data:?} is a jump"));
        let tolerance = 1e-9 * want.abs().max(1.0);
        assert!(
            (got - want).abs() <= tolerance,
            "slot {slot} of {data:?}: got {got}, want {want}"
        );
    }
}

#[test]
fn repeats_duplicate_the_previous_value() {
    assert_expands("1 2R", &[1.0, 1.0, 1.0]);
    assert_expands("1 R R", &[1.0, 1.0, 1.0]);
    assert_expands("2.5 3r", &[2.5, 2.5, 2.5, 2.5]);
}

#[test]
fn interpolation_fills_linear_steps() {
    assert_expands("1 2i 4", &[1.0, 2.0, 3.0, 4.0]);
    assert_expands("1 i 3", &[1.0, 2.0, 3.0]);
    assert_expands("1 2i 4 2i 10", &[1.0, 2.0, 3.0, 4.0, 6.0, 8.0, 10.0]);
}

#[test]
fn log_interpolation_fills_decades() {
    assert_expands("1 ilog 100", &[1.0, 10.0, 100.0]);
    assert_expands("0.01 2ILOG 10", &[0.01, 0.1, 1.0, 10.0]);
}

#[test]
fn multiply_scales_the_previous_value() {
    assert_expands("1 3M", &[1.0, 3.0]);
    assert_expands("1 3M 3M", &[1.0, 3.0, 9.0]);
    assert_expands("1 3M 2r", &[1.0, 3.0, 3.0, 3.0]);
    assert_expands("1 R 2m", &[1.0, 1.0, 2.0]);
}

#[test]
fn runs_chain_across_shortcut_kinds() {
    assert_expands("1 3M I 4", &[1.0, 3.0, 3.5, 4.0]);
    assert_expands("1 2R 2I 2.5", &[1.0, 1.0, 1.0, 1.5, 2.0, 2.5]);
    assert_expands("1 2i 4 3m", &[1.0, 2.0, 3.0, 4.0, 12.0]);
}

#[test]
fn jumps_occupy_slots_without_values() {
    assert_eq!(expanded("1 2j 4"), vec![Some(1.0), None, None, Some(4.0)]);
    assert_eq!(expanded("1 j"), vec![Some(1.0), None]);
}

#[test]
fn malformed_runs_are_rejected() {
    let cases = [
        "3J 4R",     // repeat cannot copy a jump
        "3J 2M",     // neither can multiply
        "2R",        // nothing before the run
        "10 M",      // multiply needs a factor
        "1 4I 3M",   // interpolation needs a literal end value
        "1 4I J",
        "1 2Ilog J",
        "J 2Ilog 5", // log interpolation cannot start from a jump
    ];
    for data in cases {
        let err = parse_data(&format!("si1 {data}")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedInput, "{data:?}");
    }
}

#[test]
fn pristine_runs_replay_their_original_text() {
    let cards = [
        "si1 1 2i 4",
        "si2 0.01 2ILOG 10",
        "sp1  1 3M 2r",
        "f7:n 1 2j 4",
    ];
    for card in cards {
        let tree = parse_data(card).unwrap();
        assert_eq!(tree.format(), card);
    }
}
