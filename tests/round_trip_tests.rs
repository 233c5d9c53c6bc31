//! Round-trip guarantees over whole cards
//!
//! An unmutated tree replays its original bytes, comments and
//! continuation layout included. A mutated tree re-renders only the
//! touched nodes, under the conventions captured from the source text.

use kerma::{
    Cell, Cells, DataCard, GeometryOperator, McnpVersion, Result, Surface, Surfaces, SyntaxNode,
    parse_cell, parse_data, parse_surface,
};

fn assert_replays(text: &str, parse: fn(&str) -> Result<SyntaxNode>) {
    let tree = parse(text).unwrap();
    assert_eq!(tree.format(), text, "replay of {text:?}");
}

#[test]
fn cell_cards_replay_byte_for_byte() {
    let cards = [
        "1 0 -1",
        "2 5 -2.5 -1 2 imp:n=1",
        "3 0 (1 : -2) #4 $ crown region",
        "10 0 -1\n     2 -3",
        "5 6 -7.8 -5\nc inner shield liner\n     6 -7 imp:n=2",
    ];
    for card in cards {
        assert_replays(card, parse_cell);
    }
}

#[test]
fn surface_cards_replay_byte_for_byte() {
    let cards = [
        "1 SO 10.0",
        "*2 so 5.0",
        "3 5 cz 4.0",
        "5 -1 so 4",
        "2 pz 1.602-19",
        "+6 rpp 0 1 0 1 0 1",
    ];
    for card in cards {
        assert_replays(card, parse_surface);
    }
}

#[test]
fn data_cards_replay_byte_for_byte() {
    let cards = [
        "kcode 5000 1.0 50 250",
        "mode n p",
        "imp:n 1 1 0",
        "sdef pos=0 0 0",
        "m1 1001.80c 0.5\n     8016.80c 0.5 $ oxygen",
        "f4:n 1 2j 4",
    ];
    for card in cards {
        assert_replays(card, parse_data);
    }
}

#[test]
fn formatting_an_untouched_card_changes_nothing() {
    let mut card = DataCard::parse("kcode 5000 1.0 50 250").unwrap();
    let lines = card.format(McnpVersion::default()).unwrap();
    assert_eq!(lines, vec!["kcode 5000 1.0 50 250".to_string()]);
    assert!(!card.mutated());
}

#[test]
fn continuation_layout_survives_formatting() {
    let mut cell = Cell::parse("10 0 -1\n     2 -3").unwrap();
    let lines = cell.format(McnpVersion::default()).unwrap();
    assert_eq!(lines, vec!["10 0 -1".to_string(), "     2 -3".to_string()]);
}

#[test]
fn exponent_convention_survives_value_replacement() {
    let mut surface = Surface::parse("2 pz 1.602-19").unwrap();
    assert_eq!(surface.coefficients(), vec![1.602e-19]);

    surface.set_coefficients(&[6.02e23]).unwrap();
    let lines = surface.format(McnpVersion::default()).unwrap();
    assert_eq!(lines, vec!["2 pz 6.020+23".to_string()]);
}

#[test]
fn renumbering_a_surface_rewrites_dependent_cells() {
    let mut cells = Cells::new();
    let mut surfaces = Surfaces::new();
    let cell = cells.add(Cell::parse("1 0 -10 imp:n=1").unwrap()).unwrap();
    let sphere = surfaces.add(Surface::parse("10 so 3.0").unwrap()).unwrap();

    cell.borrow_mut().update_pointers(&cells, &surfaces).unwrap();
    sphere.borrow_mut().set_number(42).unwrap();

    let lines = cell.borrow_mut().format(McnpVersion::default()).unwrap();
    assert_eq!(lines, vec!["1 0 -42 imp:n=1".to_string()]);
}

#[test]
fn renumbering_a_cell_rewrites_complements_that_use_it() {
    let mut cells = Cells::new();
    let surfaces = Surfaces::new();
    let inner = cells.add(Cell::parse("1 0 -10").unwrap()).unwrap();
    let outer = cells.add(Cell::parse("2 0 #1").unwrap()).unwrap();

    // cell 1 keeps its unresolved surface; only the complement is wired
    outer.borrow_mut().update_pointers(&cells, &surfaces).unwrap();
    inner.borrow_mut().set_number(15).unwrap();

    let lines = outer.borrow_mut().format(McnpVersion::default()).unwrap();
    assert_eq!(lines, vec!["2 0 #15".to_string()]);
}

#[test]
fn operator_edits_touch_exactly_one_column() {
    let source = "3 0 1 : -2 imp:n=1";
    let mut cell = Cell::parse(source).unwrap();
    cell.geometry_mut()
        .as_operation_mut()
        .unwrap()
        .set_operator(GeometryOperator::Intersection);

    let lines = cell.format(McnpVersion::default()).unwrap();
    assert_eq!(lines, vec!["3 0 1   -2 imp:n=1".to_string()]);

    let diff: Vec<usize> = source
        .bytes()
        .zip(lines[0].bytes())
        .enumerate()
        .filter(|(_, (a, b))| a != b)
        .map(|(i, _)| i)
        .collect();
    assert_eq!(diff, vec![6]);
}
