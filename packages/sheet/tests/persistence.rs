use devup_ui_sheet::{render, StyleDeclaration, StyleSheet, StyleValue, Theme};

fn decl(property: &str, value: &str) -> StyleDeclaration {
    StyleDeclaration::new(property, StyleValue::Static(value.into()))
}

fn built() -> StyleSheet {
    let mut sheet = StyleSheet::new();
    let (a, _) = sheet.insert(decl("color", "red"));
    let (b, _) = sheet.insert(decl("padding", "8px").at_level(1));
    let chunk = sheet.chunk_for("src/a.tsx");
    sheet.record_file_contribution("src/a.tsx", vec![a, b], Some(chunk));
    sheet.add_import("reset.css");
    sheet
}

fn restore(from: &StyleSheet) -> StyleSheet {
    let mut sheet = StyleSheet::new();
    sheet.import_sheet(&from.export_sheet().unwrap()).unwrap();
    sheet.import_class_map(&from.export_class_map().unwrap()).unwrap();
    sheet.import_file_map(&from.export_file_map().unwrap()).unwrap();
    sheet
}

#[test]
fn test_restored_sheet_renders_identically() {
    let theme = Theme::default();
    let original = built();
    let restored = restore(&original);

    for chunk in [None, Some(0)] {
        assert_eq!(
            render(&original, Some(&theme), chunk, false).unwrap(),
            render(&restored, Some(&theme), chunk, false).unwrap()
        );
    }
    assert_eq!(
        render(&restored, Some(&theme), Some(0), false).unwrap(),
        ".a{color:red}@media (min-width:480px){.b{padding:8px}}"
    );
}

#[test]
fn test_restored_sheet_keeps_allocating_where_it_left_off() {
    let mut restored = restore(&built());

    let (existing, inserted) = restored.insert(decl("color", "red"));
    assert_eq!(existing.to_string(), "a");
    assert!(!inserted);

    let (fresh, inserted) = restored.insert(decl("margin", "0"));
    assert_eq!(fresh.to_string(), "c");
    assert!(inserted);

    assert_eq!(restored.chunk_for("src/a.tsx"), 0);
    assert_eq!(restored.chunk_for("src/b.tsx"), 1);
}

#[test]
fn test_rejected_import_leaves_sheet_untouched() {
    let mut sheet = built();
    let before = sheet.export_file_map().unwrap();

    assert!(sheet.import_file_map("{\"files\": 3}").is_err());
    assert!(sheet.import_class_map("not json").is_err());
    assert_eq!(sheet.export_file_map().unwrap(), before);
    assert_eq!(sheet.len(), 2);
}
