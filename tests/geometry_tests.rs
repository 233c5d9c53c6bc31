//! Semantic geometry editing against the lossless card text

use std::collections::BTreeSet;

use kerma::{Cell, Cells, ErrorKind, McnpVersion, Surface, Surfaces};

fn format_one(cell: &mut Cell) -> String {
    cell.format(McnpVersion::default()).unwrap().join("\n")
}

#[test]
fn replacing_the_geometry_synthesizes_conventional_text() {
    let mut cell = Cell::parse("6 0 -1 imp:n=1").unwrap();
    let s2 = Surface::parse("2 so 10.0").unwrap();
    let s3 = Surface::parse("3 cz 4.0").unwrap();
    let donor = Cell::parse("9 0 -2").unwrap();

    cell.set_geometry((s2.negative() & s3.positive()) | donor.complement());
    assert!(cell.mutated());
    assert_eq!(format_one(&mut cell), "6 0 -2 3 : #9 imp:n=1");
    assert!(!cell.mutated());
}

#[test]
fn in_place_intersection_appends_to_the_existing_run() {
    let mut cell = Cell::parse("1 0 1 2").unwrap();
    let s3 = Surface::parse("3 px 1.0").unwrap();

    *cell.geometry_mut() &= s3.negative();
    assert_eq!(format_one(&mut cell), "1 0 1 2 -3");
}

#[test]
fn in_place_union_keeps_the_written_glyph_layout() {
    let mut cell = Cell::parse("5 0 -1 : -2").unwrap();
    let s3 = Surface::parse("3 so 2.0").unwrap();

    *cell.geometry_mut() |= s3.negative();
    assert_eq!(format_one(&mut cell), "5 0 -1 : -2 : -3");
}

#[test]
fn complement_operands_grow_a_union_tail() {
    let mut cell = Cell::parse("1 0 (2 : -3) #4").unwrap();
    assert_eq!(cell.surfaces(), BTreeSet::from([2, 3]));
    assert_eq!(cell.complements(), BTreeSet::from([4]));

    let s9 = Surface::parse("9 so 1.0").unwrap();
    *cell.geometry_mut() |= s9.positive();
    assert_eq!(cell.surfaces(), BTreeSet::from([2, 3, 9]));
    assert_eq!(format_one(&mut cell), "1 0 (2 : -3) #4 : 9");
}

#[test]
fn unresolved_references_name_both_ends() {
    let mut cells = Cells::new();
    let mut surfaces = Surfaces::new();
    let orphan = cells.add(Cell::parse("7 0 -99").unwrap()).unwrap();

    let err = orphan
        .borrow_mut()
        .update_pointers(&cells, &surfaces)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BrokenLink);
    assert_eq!(
        err.to_string(),
        "Surface 99 is missing from the problem, but is needed by Cell 7"
    );

    // a complement names its role instead
    let lonely = cells.add(Cell::parse("8 0 #3").unwrap()).unwrap();
    let err = lonely
        .borrow_mut()
        .update_pointers(&cells, &surfaces)
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Complement 3 is missing from the problem, but is needed by Cell 8"
    );

    // resolving succeeds once the other end exists
    surfaces.add(Surface::parse("99 so 1.0").unwrap()).unwrap();
    orphan
        .borrow_mut()
        .update_pointers(&cells, &surfaces)
        .unwrap();
}
